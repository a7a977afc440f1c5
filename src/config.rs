use serde::{Deserialize, Deserializer, Serialize};

/// One mebibyte.
pub const MIB: usize = 1024 * 1024;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ManifestConfig {
    /// Initial capacity of the pooled buffer used to scan graphsplit rows.
    #[serde(deserialize_with = "size_or_string")]
    pub scan_buffer_size: usize,
    /// Longest graphsplit row the scanner accepts.
    #[serde(deserialize_with = "size_or_string")]
    pub scan_max_line_size: usize,
    /// Capacity of the channel between the entry reader task and its consumer.
    pub entry_channel_capacity: usize,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            scan_buffer_size: MIB,
            scan_max_line_size: 10 * MIB,
            entry_channel_capacity: 1,
        }
    }
}

/// Parse a byte size such as `"10MiB"`, `"512K"`, `"1G"` or `"4096"`.
pub fn parse_byte_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let value: usize = digits
        .parse()
        .map_err(|_| format!("invalid byte size `{s}`"))?;
    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => MIB,
        "g" | "gb" | "gib" => 1024 * MIB,
        other => return Err(format!("unknown byte size unit `{other}`")),
    };
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("byte size `{s}` overflows"))
}

fn size_or_string<'deserialize, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'deserialize>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrUSize {
        String(String),
        USize(usize),
    }

    match StringOrUSize::deserialize(deserializer)? {
        StringOrUSize::String(v) => parse_byte_size(&v).map_err(serde::de::Error::custom),
        StringOrUSize::USize(v) => Ok(v),
    }
}
