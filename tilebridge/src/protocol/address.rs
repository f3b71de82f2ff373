//! Tile address parsing.
//!
//! Tile requests use the form:
//! `<scheme>://<source>/<z>/<x>/<y>`
//!
//! Examples:
//! - `pmtiles://regions/14/4680/5951`
//! - `pmtiles://https://host/v4.pmtiles/0/0/0` (source may itself contain `/`)
//!
//! The scheme is matched case-sensitively. `z`, `x` and `y` are the final
//! three path segments and must each be one or more ASCII digits.

use regex::Regex;

use super::error::ProtocolError;
use crate::coord::TileCoord;

/// Parses tile addresses for one scheme.
#[derive(Debug, Clone)]
pub struct TileAddressParser {
    scheme: String,
    pattern: Regex,
}

impl TileAddressParser {
    /// Build a parser for `scheme`.
    ///
    /// The scheme is escaped, so characters like `+` and `.` match
    /// literally.
    pub fn new(scheme: &str) -> Self {
        // Pattern breakdown:
        // ^<scheme>://  - exact scheme, case-sensitive
        // (.+)          - source identifier (anything, at least one char)
        // /(\d+)        - zoom
        // /(\d+)        - column
        // /(\d+)$       - row
        let source = format!(r"^{}://(.+)/(\d+)/(\d+)/(\d+)$", regex::escape(scheme));
        let pattern = Regex::new(&source).expect("escaped scheme always forms a valid pattern");
        Self {
            scheme: scheme.to_string(),
            pattern,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Parse a tile URL into its coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::AddressParse`] if the URL does not match the
    /// grammar or a component overflows `u32`.
    ///
    /// # Example
    ///
    /// ```
    /// use tilebridge::protocol::TileAddressParser;
    /// use tilebridge::coord::TileCoord;
    ///
    /// let parser = TileAddressParser::new("pmtiles");
    /// let tile = parser.parse("pmtiles://regions/14/4680/5951").unwrap();
    /// assert_eq!(tile, TileCoord::new(14, 4680, 5951));
    ///
    /// assert!(parser.parse("pmtiles://regions/14/4680").is_err());
    /// assert!(parser.parse("https://regions/14/4680/5951").is_err());
    /// ```
    pub fn parse(&self, url: &str) -> Result<TileCoord, ProtocolError> {
        let invalid = || ProtocolError::AddressParse(url.to_string());

        let captures = self.pattern.captures(url).ok_or_else(invalid)?;

        let component = |index: usize| -> Result<u32, ProtocolError> {
            captures
                .get(index)
                .ok_or_else(invalid)?
                .as_str()
                .parse::<u32>()
                .map_err(|_| invalid())
        };

        Ok(TileCoord {
            z: component(2)?,
            x: component(3)?,
            y: component(4)?,
        })
    }
}
