//! Memory usage report over captured objdump output of a papa kernel.

use papa_size::{report_from_objdump, ReportOptions, SizeError};

const HEADER: &str = include_str!("data/papa.objdump-f.txt");
const LISTING: &str = include_str!("data/papa.objdump-x.txt");

fn report() -> papa_size::MemoryReport {
    report_from_objdump("papa", HEADER, LISTING, "elf32-littlearm").unwrap()
}

/// Lines as whitespace-separated words, so column alignment does not matter.
fn words(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

#[test]
fn section_summary() {
    let text = report().render(&ReportOptions::default());
    let lines = words(&text);
    assert_eq!(lines[0], "Tock memory usage report for papa");
    assert_eq!(lines[1], "Kernel occupies 66816 bytes of flash");
    assert_eq!(lines[2], "66560 code and constant strings");
    assert_eq!(lines[3], "256 variable initializers");
    assert_eq!(lines[4], "Kernel occupies 12544 bytes of RAM");
    assert_eq!(lines[5], "4096 stack");
    assert_eq!(lines[6], "8192 uninitialized variables");
    assert_eq!(lines[7], "256 initialized variables");
    assert_eq!(lines[8], "8448 variables total");
    assert_eq!(lines[9], "Applications allocated 65536 bytes of RAM");
}

#[test]
fn variable_and_function_groups() {
    let text = report().render(&ReportOptions::default());
    let lines = words(&text);
    for expected in [
        "Variable groups (RAM): 1084 bytes",
        "Unmangled globals (C-like code): 32 bytes",
        "h1b::* 12 bytes",
        "kernel::* 1040 bytes",
        "Embedded data (in flash): 16 bytes",
        "Function groups (in flash): 160 bytes",
        "ARM aeabi support: 16 bytes",
        "core::* 96 bytes",
        "h1b::usb::UsbHal::irq: 48 bytes",
    ] {
        assert!(
            lines.iter().any(|l| l == expected),
            "missing line '{expected}' in:\n{text}"
        );
    }
    assert!(!text.contains("wasted"));
}

#[test]
fn deeper_grouping() {
    let options = ReportOptions {
        depth: 2,
        ..ReportOptions::default()
    };
    let summary = report().summary(&options);
    assert_eq!(summary.variable_groups["h1b::uart::"], 12);
    assert_eq!(summary.variable_groups["kernel::debug::"], 16);
    assert_eq!(summary.variable_groups["kernel::grant::"], 1024);
    assert_eq!(summary.function_groups["core::fmt::"], 96);
}

#[test]
fn waste_is_reported_on_request() {
    let options = ReportOptions {
        show_waste: true,
        ..ReportOptions::default()
    };
    let text = report().render(&options);
    let lines = words(&text);
    assert!(lines.iter().any(|l| l == "! 4 bytes wasted after h1b::uart::UART1"));
    assert!(lines.iter().any(|l| l == "Total of 4 bytes wasted in Flash+RAM"));
    assert!(!text.contains("wasted in RAM"));
}

#[test]
fn verbose_lists_gaps_without_totals() {
    let options = ReportOptions {
        verbose: true,
        ..ReportOptions::default()
    };
    let text = report().render(&options);
    assert!(text.contains("4 bytes wasted after h1b::uart::UART1"));
    assert!(!text.contains("Total of"));
}

#[test]
fn summary_serializes() {
    let summary = report().summary(&ReportOptions::default());
    assert_eq!(summary.flash_bytes, 66816);
    assert_eq!(summary.ram_bytes, 12544);
    assert_eq!(summary.embedded_data_bytes, 16);
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["sections"]["app_memory"], 65536);
    assert_eq!(json["waste"][0]["bytes"], 4);
}

#[test]
fn rejects_other_architectures() {
    let err = report_from_objdump("papa", HEADER, LISTING, "elf32-littleriscv").unwrap_err();
    assert!(matches!(err, SizeError::UnsupportedFormat { .. }));
}

#[test]
fn rejects_listing_without_sections() {
    let err = report_from_objdump("papa", HEADER, "SYMBOL TABLE:\n", "elf32-littlearm")
        .unwrap_err();
    assert!(matches!(err, SizeError::MissingSection { name: "text" }));
}
