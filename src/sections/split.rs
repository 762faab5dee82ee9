//! Show-command splitter
//!
//! Splits a capture of several commands (`R1#show run`, `R1#show ver`, ...)
//! into named sections:
//! R1#show running-config   → running
//! R1#sh ip int brief       → ip_interface_brief
//! R1#show cdp neighbors    → cdp_neighbors

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Static regex for prompt lines that issue a show command
pub static DEFAULT_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*#sh.*").expect("Invalid DEFAULT_HEADER_RE regex"));

/// Section name → lines, header line included, in first-seen order
pub type SectionMap = IndexMap<String, Vec<String>>;

enum Keyword {
    Name(&'static str),
    /// Refine by a second keyword; the first match wins
    Group(&'static [(&'static str, &'static str)]),
}

/// Checked in order against the lowercased header; the first hit wins.
static KEYWORDS: &[(&str, Keyword)] = &[
    (
        " cdp ",
        Keyword::Group(&[("det", "cdp_neighbors_detail"), ("nei", "cdp_neighbors")]),
    ),
    (
        " ip ",
        Keyword::Group(&[
            ("int", "ip_interface_brief"),
            ("route", "ip_route"),
            ("arp", "ip_arp"),
            ("pro", "ip_protocols"),
        ]),
    ),
    (
        " int",
        Keyword::Group(&[
            ("sum", "interface_summary"),
            ("des", "interface_description"),
            ("stat", "interface_status"),
            ("tran", "interfaces_transceiver_properties"),
            ("cap", "interfaces_capabilities"),
            ("vlan-interface brief", "interfaces_vlan_brief"),
            ("brief", "interfaces_brief"),
            ("int", "interfaces"),
        ]),
    ),
    (
        " switch",
        Keyword::Group(&[
            ("detail", "switch_detail"),
            ("service", "switch_service_modules"),
            ("switch", "switch"),
        ]),
    ),
    (" stack all", Keyword::Name("stack_all")),
    (" run", Keyword::Name("running")),
    (" ver", Keyword::Name("version")),
    (" lic", Keyword::Name("license")),
    (" inv", Keyword::Name("inventory")),
    (
        " vlan",
        Keyword::Group(&[("port all detail", "vlan_port_all_detail"), ("vlan", "vlan")]),
    ),
    (" module", Keyword::Name("module")),
    (" mac add", Keyword::Name("mac_address_table")),
    (" power inline", Keyword::Name("power_inline")),
    (" flash", Keyword::Name("flash")),
    (" port trunk", Keyword::Name("port_trunk")),
    (" current-conf", Keyword::Name("current_config")),
    (" stp root", Keyword::Name("stp_root")),
    (" device", Keyword::Name("device")),
    (" ssh server status", Keyword::Name("ssh_server_status")),
    (
        " lldp",
        Keyword::Group(&[("neighbor-information list", "lldp_neighbor_list")]),
    ),
    (" dir", Keyword::Group(&[("/all", "dir_all")])),
    (" etherc", Keyword::Group(&[("su", "etherchannel_summary")])),
];

/// Section name for a lowercased command header, if it is a known command
pub fn section_name(header: &str) -> Option<&'static str> {
    let (_, keyword) = KEYWORDS.iter().find(|(key, _)| header.contains(key))?;
    match keyword {
        Keyword::Name(name) => Some(*name),
        Keyword::Group(group) => group
            .iter()
            .find(|(key, _)| header.contains(key))
            .map(|(_, name)| *name),
    }
}

/// Names every header can resolve to, in table order
pub fn known_sections() -> impl Iterator<Item = &'static str> {
    KEYWORDS.iter().flat_map(|(_, keyword)| match keyword {
        Keyword::Name(name) => vec![*name],
        Keyword::Group(group) => group.iter().map(|(_, name)| *name).collect::<Vec<_>>(),
    })
}

/// Split `lines` into sections at each header.
///
/// A header is a line whose lowercased text matches `header` (default
/// `.*#sh.*`). Lines before the first known header, and lines after an
/// unknown one, belong to no section. A repeated command starts its section
/// over.
pub fn split_sections<I, S>(lines: I, header: Option<&Regex>) -> SectionMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let header = header.unwrap_or(&DEFAULT_HEADER_RE);
    let mut sections = SectionMap::new();
    let mut current: Option<&'static str> = None;

    for line in lines {
        let line = line.as_ref();
        let lower = line.to_lowercase();

        if let Some(found) = header.find(&lower) {
            current = section_name(found.as_str());
            match current {
                Some(name) => {
                    debug!(section = name, "section header");
                    sections.insert(name.to_string(), Vec::new());
                }
                None => warn!(header = %line.trim(), "unrecognised command header"),
            }
        }

        if let Some(lines) = current.and_then(|name| sections.get_mut(name)) {
            lines.push(line.trim_end().to_string());
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_name_lookup() {
        assert_eq!(section_name("r1#show running-config"), Some("running"));
        assert_eq!(section_name("r1#sh ver"), Some("version"));
        assert_eq!(section_name("r1#sh ip int brief"), Some("ip_interface_brief"));
        assert_eq!(section_name("r1#show cdp neighbors detail"), Some("cdp_neighbors_detail"));
        assert_eq!(section_name("r1#show cdp neighbors"), Some("cdp_neighbors"));
        assert_eq!(section_name("sw#show interfaces status"), Some("interface_status"));
        assert_eq!(section_name("sw#show interfaces"), Some("interfaces"));
        assert_eq!(section_name("sw#show vlan port all detail"), Some("vlan_port_all_detail"));
        assert_eq!(section_name("sw#show mac address-table"), Some("mac_address_table"));
    }

    #[test]
    fn test_section_name_unknown() {
        assert_eq!(section_name("r1#show clock"), None);
        // Matches the group keyword but none of its refinements.
        assert_eq!(section_name("r1#show lldp neighbors"), None);
    }

    #[test]
    fn test_split_sections() {
        let lines = [
            "banner before any command",
            "R1#show running-config",
            "hostname R1",
            "R1#show version  ",
            "Cisco IOS Software",
            "R1#show clock",
            "*10:00:00.000 UTC Mon Mar 1 2021",
            "R1#sh ip int brief",
            "Interface  IP-Address  OK? Method Status  Protocol",
        ];
        let sections = split_sections(lines, None);
        let names: Vec<&str> = sections.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["running", "version", "ip_interface_brief"]);
        assert_eq!(sections["running"], vec!["R1#show running-config", "hostname R1"]);
        assert_eq!(sections["version"], vec!["R1#show version", "Cisco IOS Software"]);
        assert_eq!(sections["ip_interface_brief"].len(), 2);
    }

    #[test]
    fn test_repeated_command_restarts_section() {
        let lines = ["R1#sh ver", "first", "R1#sh run", "hostname R1", "R1#sh ver", "second"];
        let sections = split_sections(lines, None);
        assert_eq!(sections["version"], vec!["R1#sh ver", "second"]);
        assert_eq!(sections.get_index_of("version"), Some(0));
    }

    #[test]
    fn test_custom_header_pattern() {
        let header = Regex::new(r"^>>> .*").unwrap();
        let lines = [">>> show run", "hostname R1", "R1#sh ver", "not a header here"];
        let sections = split_sections(lines, Some(&header));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections["running"].len(), 4);
    }

    #[test]
    fn test_known_sections() {
        let names: Vec<&str> = known_sections().collect();
        assert_eq!(names.first(), Some(&"cdp_neighbors_detail"));
        assert!(names.contains(&"running"));
        assert_eq!(names.last(), Some(&"etherchannel_summary"));
    }
}
