//! Cross-cutting parser contract: every registered parser returns a list
//! for every input — empty-like input yields an empty list, hostile input
//! never panics — and every emitted MAC is canonical.

use nmv_domain::ParsedRecord;
use nmv_parsers::plugins::builtin_parsers;
use nmv_parsers::ParserRegistry;

const HOSTILE_INPUTS: &[&str] = &[
    "",
    "   ",
    "\n\n\n",
    "\t \t",
    "%% Banner of the Day %%\nUnauthorized access prohibited\n",
    "Interface\n",
    "Port      Name               Status\n----      ----               ------\n",
    "{\"unexpected\": [1, 2, 3]}",
    "0xDEADBEEF \x01\x02\x03",
    "interface,,,,,\n,,,,\n",
    "Slot :\nFanID Status\n",
];

#[test]
fn every_parser_survives_hostile_input() {
    for parser in builtin_parsers() {
        for input in HOSTILE_INPUTS {
            // Must not panic; empty-like input must yield an empty list.
            let records = parser.parse(input);
            if input.trim().is_empty() {
                assert!(
                    records.is_empty(),
                    "{} returned records for empty-like input",
                    parser.api_name()
                );
            }
        }
    }
}

#[test]
fn emitted_macs_are_always_canonical() {
    let canonical = regex::Regex::new("^[0-9A-F]{2}(:[0-9A-F]{2}){5}$").unwrap();
    let samples = [
        (
            "get_mac_table_ios_dna",
            "Vlan    Mac Address       Type        Ports\n  10    68a8.2845.7640    DYNAMIC     Gi1/0/3\n",
        ),
        (
            "get_mac_table_hpe_dna",
            "0001-0203-0405   100        Learned        GE1/0/1   Y\n",
        ),
        (
            "get_arp_table_hpe_fna",
            "10.1.1.1        000c-29aa-bb01 100   GE1/0/1   20    Dynamic\n",
        ),
    ];

    let registry = ParserRegistry::with_builtin_parsers().unwrap();
    for (api_name, raw) in samples {
        let parser = registry.get_or_raise(api_name, None).unwrap_or_else(|_| {
            // Vendor-bound parsers need their device type for exact lookup.
            let keys = registry.keys();
            let key = keys.iter().find(|k| k.api_name == api_name).unwrap();
            registry.get_or_raise(api_name, key.device_type).unwrap()
        });
        for record in parser.parse(raw) {
            match record {
                ParsedRecord::MacTable(e) => {
                    assert!(canonical.is_match(e.mac_address.as_str()))
                }
                ParsedRecord::Arp(e) => assert!(canonical.is_match(e.mac_address.as_str())),
                _ => {}
            }
        }
    }
}

#[test]
fn registry_has_unique_keys_for_all_builtins() {
    // with_builtin_parsers() errors on duplicates, so success here proves
    // the full plugin set has disjoint (device_type, api_name) keys.
    let registry = ParserRegistry::with_builtin_parsers().unwrap();
    assert_eq!(registry.len(), builtin_parsers().len());
}
