pub const DEFAULT_PORT: u16 = 5005;
pub const SSE_KEEPALIVE_SECS: u64 = 15;
pub const DEFAULT_BROADCAST_BUFFER: usize = 256;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
pub const DEFAULT_DISTRICT_IDS: [&str; 9] = ["A", "B", "C", "D", "E", "F", "G", "H", "I"];

pub fn server_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_PORT)
}

pub fn sse_broadcast_buffer() -> usize {
    std::env::var("SSE_BROADCAST_BUFFER")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_BROADCAST_BUFFER)
}

pub fn static_dir() -> String {
    std::env::var("STATIC_DIR")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
}

/// District ids from the comma-separated `DISTRICT_IDS`, in order, without
/// blanks or duplicates. Falls back to `A`..`I`.
pub fn district_ids() -> Vec<String> {
    let parsed = std::env::var("DISTRICT_IDS")
        .map(|value| parse_district_ids(&value))
        .unwrap_or_default();
    if parsed.is_empty() {
        return DEFAULT_DISTRICT_IDS.iter().map(|id| id.to_string()).collect();
    }
    parsed
}

fn parse_district_ids(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_when_unset_or_invalid() {
        temp_env::with_var_unset("PORT", || {
            assert_eq!(server_port(), DEFAULT_PORT);
        });
        temp_env::with_var("PORT", Some("not-a-port"), || {
            assert_eq!(server_port(), DEFAULT_PORT);
        });
        temp_env::with_var("PORT", Some("0"), || {
            assert_eq!(server_port(), DEFAULT_PORT);
        });
        temp_env::with_var("PORT", Some(" 8080 "), || {
            assert_eq!(server_port(), 8080);
        });
    }

    #[test]
    fn broadcast_buffer_rejects_zero() {
        temp_env::with_var("SSE_BROADCAST_BUFFER", Some("0"), || {
            assert_eq!(sse_broadcast_buffer(), DEFAULT_BROADCAST_BUFFER);
        });
        temp_env::with_var("SSE_BROADCAST_BUFFER", Some("32"), || {
            assert_eq!(sse_broadcast_buffer(), 32);
        });
    }

    #[test]
    fn district_ids_parse_trim_and_dedupe() {
        temp_env::with_var("DISTRICT_IDS", Some(" north, south ,,north,east "), || {
            assert_eq!(district_ids(), vec!["north", "south", "east"]);
        });
    }

    #[test]
    fn district_ids_fall_back_to_defaults() {
        temp_env::with_var_unset("DISTRICT_IDS", || {
            assert_eq!(district_ids().len(), DEFAULT_DISTRICT_IDS.len());
            assert_eq!(district_ids()[0], "A");
        });
        temp_env::with_var("DISTRICT_IDS", Some(" , "), || {
            assert_eq!(district_ids().len(), DEFAULT_DISTRICT_IDS.len());
        });
    }

    #[test]
    fn static_dir_ignores_blank_values() {
        temp_env::with_var("STATIC_DIR", Some("  "), || {
            assert_eq!(static_dir(), DEFAULT_STATIC_DIR);
        });
        temp_env::with_var("STATIC_DIR", Some("/srv/viewer"), || {
            assert_eq!(static_dir(), "/srv/viewer");
        });
    }
}
