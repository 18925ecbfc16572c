//! Configuration of the Tessera Templating Engine.
// Copyright (C) 2024  Frankie Baffa
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use {
    crate::{
        error::{
            Error,
            Result,
        },
        file::read_file,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    serde_json::from_str as from_json_str,
    std::path::Path,
};

/// Delimiters and behavioural switches consumed by the lexer, parser and
/// renderer.
///
/// Every field has a default, so a JSON configuration file only needs to
/// name the settings it changes.
///
/// ```rust
/// use tessera_core::Config;
///
/// let config: Config = serde_json::from_str(r#"{ "trim_blocks": true }"#).unwrap();
/// assert!(config.trim_blocks);
/// assert_eq!("{{", config.variable_start_string);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub
struct Config {
    pub block_start_string: String,
    pub block_end_string: String,
    pub variable_start_string: String,
    pub variable_end_string: String,
    pub comment_start_string: String,
    pub comment_end_string: String,
    /// Remove the first newline after a block tag.
    pub trim_blocks: bool,
    /// Strip spaces and tabs from the start of a line up to a block tag.
    pub lstrip_blocks: bool,
    /// Escape the output of `{{ }}` unless it is marked safe.
    pub auto_escape: bool,
    /// Referencing an unbound name, attribute or item is an error.
    pub strict_undefined: bool,
    /// Keep the single trailing newline of a template source.
    pub keep_trailing_newline: bool,
    /// How deeply includes, imports and macro calls may nest.
    pub recursion_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_start_string: "{%".to_owned(),
            block_end_string: "%}".to_owned(),
            variable_start_string: "{{".to_owned(),
            variable_end_string: "}}".to_owned(),
            comment_start_string: "{#".to_owned(),
            comment_end_string: "#}".to_owned(),
            trim_blocks: false,
            lstrip_blocks: false,
            auto_escape: false,
            strict_undefined: false,
            keep_trailing_newline: false,
            recursion_limit: 32,
        }
    }
}

impl Config {
    /// Read a configuration from a JSON file.
    pub
    fn read<P: AsRef<Path>>(p: P) -> Result<Self> {
        let content = read_file(&p)?;
        let config = from_json_str::<Self>(&content)
            .map_err(|e| Error::JsonParse(e, p.as_ref().into()))?;
        config.validate()?;
        Ok(config)
    }

    /// Ensure the delimiters can be told apart by the lexer.
    pub
    fn validate(&self) -> Result<()> {
        let starts = [
            ("block_start_string", &self.block_start_string),
            ("variable_start_string", &self.variable_start_string),
            ("comment_start_string", &self.comment_start_string),
        ];
        let ends = [
            ("block_end_string", &self.block_end_string),
            ("variable_end_string", &self.variable_end_string),
            ("comment_end_string", &self.comment_end_string),
        ];

        for (name, value) in starts.iter().chain(ends.iter()) {
            if value.is_empty() {
                return Err(Error::InvalidConfig(format!("{} must not be empty", name)));
            }
        }

        for (i, (a_name, a)) in starts.iter().enumerate() {
            for (b_name, b) in starts.iter().skip(i + 1) {
                if a == b {
                    return Err(Error::InvalidConfig(format!(
                        "{} and {} are both {:?}", a_name, b_name, a
                    )));
                }
            }
        }

        Ok(())
    }
}
