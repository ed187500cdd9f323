//! TDMS object paths: `/`, `/'group'` and `/'group'/'channel'`.
//!
//! Names are wrapped in single quotes; a quote inside a name is doubled.

use std::fmt;

use super::error::TdmsError;

/// Parsed path of a TDMS object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectPath {
    /// The file (root) object
    Root,
    /// A group object
    Group(String),
    /// A channel object inside a group
    Channel {
        /// Owning group name
        group: String,
        /// Channel name
        channel: String,
    },
}

impl ObjectPath {
    /// Parse a path string from segment metadata
    pub fn parse(path: &str) -> Result<Self, TdmsError> {
        if path == "/" {
            return Ok(ObjectPath::Root);
        }

        let mut components = Vec::with_capacity(2);
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '/' || chars.next() != Some('\'') {
                return Err(TdmsError::InvalidPath(path.to_string()));
            }

            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        name.push('\'');
                    }
                    Some('\'') => break,
                    Some(other) => name.push(other),
                    None => return Err(TdmsError::InvalidPath(path.to_string())),
                }
            }
            components.push(name);
        }

        let mut components = components.into_iter();
        match (components.next(), components.next(), components.next()) {
            (Some(group), None, None) => Ok(ObjectPath::Group(group)),
            (Some(group), Some(channel), None) => Ok(ObjectPath::Channel { group, channel }),
            _ => Err(TdmsError::InvalidPath(path.to_string())),
        }
    }

    /// Group path
    pub fn group(name: impl Into<String>) -> Self {
        ObjectPath::Group(name.into())
    }

    /// Channel path
    pub fn channel(group: impl Into<String>, channel: impl Into<String>) -> Self {
        ObjectPath::Channel {
            group: group.into(),
            channel: channel.into(),
        }
    }
}

fn write_component(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    write!(f, "/'{}'", name.replace('\'', "''"))
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectPath::Root => f.write_str("/"),
            ObjectPath::Group(group) => write_component(f, group),
            ObjectPath::Channel { group, channel } => {
                write_component(f, group)?;
                write_component(f, channel)
            }
        }
    }
}
