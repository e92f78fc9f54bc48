//! Symbol naming and grouping.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::objdump::RawSymbol;

/// A symbol with a readable name and its footprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub addr: u64,
    /// Size reported by the symbol table.
    pub size: u64,
    /// Distance to the next symbol (includes padding and embedded data).
    /// Zero for the last symbol of a segment.
    pub total_size: u64,
}

/// Drop a trailing `::h<16 hex digits>` component.
pub fn trim_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::") {
        Some((head, last))
            if last.len() == 17
                && last.starts_with('h')
                && last[1..].chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            head
        }
        _ => symbol,
    }
}

/// Demangle a Rust symbol, without its hash. `None` if not mangled.
pub fn demangle(name: &str) -> Option<String> {
    let demangled = rustc_demangle::try_demangle(name).ok()?;
    Some(trim_hash(&format!("{demangled:#}")).to_string())
}

/// Turns objdump names into readable symbol names.
pub struct Namer {
    dollar_path: Regex,
}

impl Namer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dollar_path: Regex::new(r"\$(((\w+\.\.)+)(\w+))\$")?,
        })
    }

    /// Readable name for a variable symbol.
    pub fn variable(&self, raw: &str) -> String {
        demangle(raw).unwrap_or_else(|| raw.to_string())
    }

    /// Readable name for a code symbol. Code symbols may also appear as
    /// `$a..b..c$`, meaning `a::b::c`.
    pub fn function(&self, raw: &str) -> String {
        if let Some(caps) = self.dollar_path.captures(raw) {
            let path = caps[1].replace("..", "::");
            return trim_hash(&path).to_string();
        }
        self.variable(raw)
    }

    pub fn symbol(&self, raw: &RawSymbol, function: bool) -> Symbol {
        let name = if function {
            self.function(&raw.name)
        } else {
            self.variable(&raw.name)
        };
        Symbol {
            name,
            addr: raw.addr,
            size: raw.size,
            total_size: 0,
        }
    }
}

/// Sort by address and fill in `total_size` from each symbol's successor.
///
/// Returns the padding: bytes between symbols not covered by their sizes.
pub fn compute_padding(symbols: &mut [Symbol]) -> u64 {
    symbols.sort_by_key(|s| s.addr);
    let mut padding = 0;
    for i in 1..symbols.len() {
        let next_addr = symbols[i].addr;
        let prev = &mut symbols[i - 1];
        prev.total_size = next_addr - prev.addr;
        padding += prev.total_size.saturating_sub(prev.size);
    }
    padding
}

/// Group key and member name for `symbol` at `depth`.
///
/// Path symbols (`a::b::c`) group by their first `depth` components, with a
/// trailing `::` on the key. Other names group into fixed categories.
pub fn group_key(symbol: &str, depth: usize) -> (String, String) {
    let tokens: Vec<&str> = symbol.split("::").collect();
    if tokens.len() == 1 {
        let key = if symbol.starts_with(".Lanon")
            || symbol.starts_with("anon.")
            || symbol.starts_with("str.")
        {
            "Constant strings"
        } else if symbol.starts_with(".hidden ") {
            "ARM aeabi support"
        } else if symbol.starts_with("_ZN") {
            "Unidentified auto-generated"
        } else {
            "Unmangled globals (C-like code)"
        };
        return (key.to_string(), symbol.to_string());
    }

    let split = depth.min(tokens.len());
    (
        format!("{}::", tokens[..split].join("::")),
        tokens[split..].join("::"),
    )
}

/// Bytes lost between two symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Waste {
    /// Symbol the gap follows.
    pub after: String,
    pub bytes: u64,
}

/// Symbols grouped by name prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Groups {
    pub groups: BTreeMap<String, Vec<(String, u64)>>,
}

impl Groups {
    /// Add `symbols` (sorted by address) at `depth`. Zero-size symbols are
    /// skipped. Returns every gap between consecutive symbols.
    pub fn add(&mut self, symbols: &[Symbol], depth: usize) -> Vec<Waste> {
        let mut waste = Vec::new();
        let mut expected: Option<(u64, &str)> = None;

        for symbol in symbols.iter().filter(|s| s.size != 0) {
            if let Some((expected_addr, prev)) = expected {
                if symbol.addr > expected_addr {
                    waste.push(Waste {
                        after: prev.to_string(),
                        bytes: symbol.addr - expected_addr,
                    });
                }
            }

            let (key, name) = group_key(&symbol.name, depth);
            self.groups.entry(key).or_default().push((name, symbol.size));
            expected = Some((symbol.addr.saturating_add(symbol.size), &symbol.name));
        }
        waste
    }

    pub fn total(&self) -> u64 {
        self.groups
            .values()
            .flat_map(|members| members.iter().map(|(_, size)| size))
            .sum()
    }

    /// Per-group byte totals.
    pub fn sizes(&self) -> BTreeMap<String, u64> {
        self.groups
            .iter()
            .map(|(key, members)| (key.clone(), members.iter().map(|(_, s)| s).sum()))
            .collect()
    }

    /// Display label for a group.
    ///
    /// A namespace with several members renders as `a::*`; a single member
    /// renders as its full name.
    pub fn label(key: &str, members: &[(String, u64)]) -> String {
        match (key.strip_suffix("::"), members) {
            (Some(prefix), [(name, _)]) if !name.is_empty() => format!("{prefix}::{name}:"),
            (Some(prefix), [_]) => format!("{prefix}:"),
            (Some(_), _) => format!("{key}*"),
            (None, _) => format!("{key}:"),
        }
    }
}
