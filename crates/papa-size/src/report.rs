//! The kernel memory usage report.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Result;
use crate::objdump::{ObjdumpListing, Segment};
use crate::symbol::{compute_padding, Groups, Namer, Symbol, Waste};

/// Report rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Group symbols by their first `depth` path components. 0 puts every
    /// path symbol in one group.
    pub depth: usize,
    /// Print every gap between variables.
    pub verbose: bool,
    /// Print gaps and per-section waste totals.
    pub show_waste: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            depth: 1,
            verbose: false,
            show_waste: false,
        }
    }
}

/// Sizes of the kernel sections, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionSizes {
    pub text: u64,
    pub relocate: u64,
    pub sram: u64,
    pub stack: u64,
    pub app_memory: u64,
}

impl SectionSizes {
    /// Code, constants, and initializers.
    pub fn flash(&self) -> u64 {
        self.text.saturating_add(self.relocate)
    }

    /// Stack plus all kernel variables.
    pub fn ram(&self) -> u64 {
        self.stack.saturating_add(self.sram).saturating_add(self.relocate)
    }

    pub fn variables(&self) -> u64 {
        self.sram.saturating_add(self.relocate)
    }
}

/// Kernel symbols split by segment, sorted by address, with padding known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryReport {
    pub elf: String,
    pub sections: SectionSizes,
    /// Variables in `.relocate`.
    pub initialized: Vec<Symbol>,
    /// Variables in `.sram`.
    pub uninitialized: Vec<Symbol>,
    /// Code in `.text`.
    pub functions: Vec<Symbol>,
    /// Bytes in `.text` not covered by function sizes (constants after
    /// functions, alignment).
    pub embedded_data: u64,
}

/// Machine-readable form of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemorySummary {
    pub elf: String,
    pub flash_bytes: u64,
    pub ram_bytes: u64,
    pub app_memory_bytes: u64,
    pub sections: SectionSizes,
    pub variable_groups: BTreeMap<String, u64>,
    pub function_groups: BTreeMap<String, u64>,
    pub embedded_data_bytes: u64,
    pub waste: Vec<Waste>,
}

impl MemoryReport {
    /// Build a report from parsed `objdump -x` output.
    pub fn from_listing(elf: impl Into<String>, listing: &ObjdumpListing) -> Result<Self> {
        let sections = SectionSizes {
            text: listing.section(Segment::Text)?,
            relocate: listing.section(Segment::Relocate)?,
            sram: listing.section(Segment::Sram)?,
            stack: listing.section(Segment::Stack)?,
            app_memory: listing.section(Segment::AppMemory)?,
        };

        let namer = Namer::new()?;
        let mut initialized = Vec::new();
        let mut uninitialized = Vec::new();
        let mut functions = Vec::new();
        for raw in &listing.symbols {
            match raw.segment {
                Segment::Relocate => initialized.push(namer.symbol(raw, false)),
                Segment::Sram => uninitialized.push(namer.symbol(raw, false)),
                Segment::Text => functions.push(namer.symbol(raw, true)),
                Segment::Stack | Segment::AppMemory => {}
            }
        }

        compute_padding(&mut initialized);
        compute_padding(&mut uninitialized);
        let embedded_data = compute_padding(&mut functions);

        Ok(Self {
            elf: elf.into(),
            sections,
            initialized,
            uninitialized,
            functions,
            embedded_data,
        })
    }

    /// Group variables; returns the groups and the waste found in
    /// `.relocate` and `.sram` respectively.
    fn variable_groups(&self, depth: usize) -> (Groups, Vec<Waste>, Vec<Waste>) {
        let mut groups = Groups::default();
        let init_waste = groups.add(&self.initialized, depth);
        let uninit_waste = groups.add(&self.uninitialized, depth);
        (groups, init_waste, uninit_waste)
    }

    /// Embedded constants after functions are not counted in symbol sizes,
    /// so gaps in code are not reported as waste.
    fn function_groups(&self, depth: usize) -> Groups {
        let mut groups = Groups::default();
        groups.add(&self.functions, depth);
        groups
    }

    pub fn summary(&self, options: &ReportOptions) -> MemorySummary {
        let (variables, init_waste, uninit_waste) = self.variable_groups(options.depth);
        MemorySummary {
            elf: self.elf.clone(),
            flash_bytes: self.sections.flash(),
            ram_bytes: self.sections.ram(),
            app_memory_bytes: self.sections.app_memory,
            sections: self.sections,
            variable_groups: variables.sizes(),
            function_groups: self.function_groups(options.depth).sizes(),
            embedded_data_bytes: self.embedded_data,
            waste: init_waste.into_iter().chain(uninit_waste).collect(),
        }
    }

    /// Render the human-readable report.
    pub fn render(&self, options: &ReportOptions) -> String {
        let s = &self.sections;
        let mut out = String::new();

        let _ = writeln!(out, "Tock memory usage report for {}", self.elf);
        let _ = writeln!(out, "Kernel occupies {} bytes of flash", s.flash());
        let _ = writeln!(out, "  {:>6}\tcode and constant strings", s.text);
        let _ = writeln!(out, "  {:>6}\tvariable initializers", s.relocate);
        let _ = writeln!(out, "Kernel occupies {} bytes of RAM", s.ram());
        let _ = writeln!(out, "  {:>6}\tstack", s.stack);
        let _ = writeln!(out, "  {:>6}\tuninitialized variables", s.sram);
        let _ = writeln!(out, "  {:>6}\tinitialized variables", s.relocate);
        let _ = writeln!(out, "  {:>6}\tvariables total", s.variables());
        let _ = writeln!(out, "Applications allocated {} bytes of RAM", s.app_memory);
        out.push('\n');

        let (variables, init_waste, uninit_waste) = self.variable_groups(options.depth);
        for (waste, section) in [(&init_waste, "Flash+RAM"), (&uninit_waste, "RAM")] {
            if options.show_waste || options.verbose {
                for w in waste {
                    let _ = writeln!(out, "  ! {} bytes wasted after {}", w.bytes, w.after);
                }
            }
            let total: u64 = waste.iter().map(|w| w.bytes).sum();
            if options.show_waste && total > 0 {
                let _ = writeln!(out, "Total of {total} bytes wasted in {section}");
                out.push('\n');
            }
        }
        render_groups(&mut out, "Variable groups (RAM)", &variables);
        out.push('\n');

        let _ = writeln!(out, "Embedded data (in flash): {} bytes", self.embedded_data);
        out.push('\n');

        render_groups(
            &mut out,
            "Function groups (in flash)",
            &self.function_groups(options.depth),
        );
        out
    }
}

fn render_groups(out: &mut String, title: &str, groups: &Groups) {
    let _ = writeln!(out, "{title}: {} bytes", groups.total());

    let rows: Vec<(String, u64)> = groups
        .groups
        .iter()
        .map(|(key, members)| {
            (
                Groups::label(key, members),
                members.iter().map(|(_, size)| size).sum(),
            )
        })
        .collect();
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 2;
    for (label, size) in rows {
        let _ = writeln!(out, "  {label:<width$}{size} bytes");
    }
}
