//! `id-name-route` identity messages
//!
//! Both the wristband code read by the scanner and the message written over
//! the radio carry the same dash-joined record, e.g. `42-Kim-ER5`.

use heapless::String;

/// Capacity of the id field
pub const ID_LEN: usize = 16;
/// Capacity of the name field
pub const NAME_LEN: usize = 32;
/// Capacity of the route field
pub const ROUTE_LEN: usize = 16;
/// Characters of the route shown on a panel
pub const ROUTE_BADGE_CHARS: usize = 2;

/// Field separator
pub const SEPARATOR: char = '-';

/// Patient identifier, the deduplication key
pub type PatientId = String<ID_LEN>;

/// A parsed identity message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    /// Patient id
    pub id: PatientId,
    /// Display name
    pub name: String<NAME_LEN>,
    /// Route fragment (empty when the message had only two fields)
    pub route: String<ROUTE_LEN>,
}

impl IdentityRecord {
    /// Parse a dash-joined message
    ///
    /// Needs at least two fields and a non-empty id. Fields past the third
    /// are ignored and over-long fields are truncated.
    pub fn parse(message: &str) -> Option<Self> {
        let mut fields = message.split(SEPARATOR);
        let id = fields.next()?;
        let name = fields.next()?;
        let route = fields.next().unwrap_or("");

        if id.is_empty() {
            return None;
        }

        Some(Self {
            id: bounded(id),
            name: bounded(name),
            route: bounded(route),
        })
    }

    /// First two characters of the route, as drawn on the confirmed panel
    pub fn route_badge(&self) -> &str {
        prefix_chars(&self.route, ROUTE_BADGE_CHARS)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IdentityRecord {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{=str}-{=str}-{=str}",
            self.id.as_str(),
            self.name.as_str(),
            self.route.as_str()
        )
    }
}

/// Copy `s` into a bounded string, truncating at a character boundary
fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn prefix_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
