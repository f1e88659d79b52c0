use crate::error::{BloomError, Result};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Splits a size in bits into a byte amount and a binary unit.
pub fn memsize(bits: u64) -> (f64, &'static str) {
    let bytes = bits as f64 / 8.0;
    if bytes >= GIB {
        (bytes / GIB, "GiB")
    } else if bytes >= MIB {
        (bytes / MIB, "MiB")
    } else if bytes >= KIB {
        (bytes / KIB, "kiB")
    } else {
        (bytes, "B")
    }
}

// Helper method to format a filter size in bits in human-readable form
pub fn bits2hr(bits: u64) -> String {
    let (size, unit) = memsize(bits);
    format!("{size:.2} {unit}")
}

/// Parses a memory amount such as `"10MB"`, `"1.5GiB"` or `"512"` into
/// bytes. Decimal and binary suffixes both mean powers of 1024.
pub fn parse_mem(s: &str) -> Result<u64> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);

    let size: f64 = num
        .parse()
        .map_err(|e| BloomError::InvalidConfig(format!("memory size {s:?}: {e}")))?;
    let scale = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "kb" | "kib" => KIB,
        "mb" | "mib" => MIB,
        "gb" | "gib" => GIB,
        other => {
            return Err(BloomError::InvalidConfig(format!(
                "memory size {s:?}: unknown unit {other:?}"
            )));
        }
    };
    Ok((size * scale) as u64)
}
