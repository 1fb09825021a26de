// Copyright 2025 Tellus Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! WKT point extraction
//!
//! Point columns hold text literals of the form `"POINT(<lon> <lat>)"`,
//! often nested inside the quotes of the RDF literal serialization. The
//! extraction first strips the outermost quote pair, then parses the
//! remaining WKT.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{Error, Result};

static WKT_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*[Pp][Oo][Ii][Nn][Tt]\s*\(\s*(-?[0-9]+(?:\.[0-9]+)?)\s+(-?[0-9]+(?:\.[0-9]+)?)\s*\)\s*$",
    )
    .expect("WKT point pattern is valid")
});

/// Return the substring between the first two double quotes.
///
/// If the input holds fewer than two quotes, it is returned as a whole.
pub fn text_between_quotes(text: &str) -> &str {
    let Some(first) = text.find('"') else {
        return text;
    };
    let rest = &text[first + 1..];
    match rest.find('"') {
        Some(second) => &rest[..second],
        None => text,
    }
}

/// Parse a WKT `POINT(lon lat)` literal into `(lon, lat)` degrees.
///
/// The keyword is case-insensitive and surrounding whitespace is
/// tolerated; anything else fails with [`Error::InvalidWktPoint`].
pub fn parse_wkt_point(text: &str) -> Result<(f64, f64)> {
    let captures = WKT_POINT
        .captures(text)
        .ok_or_else(|| Error::InvalidWktPoint(text.to_string()))?;
    // The pattern only admits decimal number syntax, so parsing cannot fail.
    let lon: f64 = captures[1].parse().expect("matched decimal number");
    let lat: f64 = captures[2].parse().expect("matched decimal number");
    Ok((lon, lat))
}
