//! Saving and restoring group state.
//!
//! A model is stored as a single property whose key is the caller's prefix
//! followed by the configured persistence key (`.groupModel` by default).
//! The value lists one record per group, each terminated by `|`:
//!
//! ```text
//! name=startIndex:visibleStartIndex:visibleStartPosition:originalSpan:visibleSpan:collapsed|expanded:collapseable|uncollapseable:breakable|unbreakable[:static,static,...]
//! ```
//!
//! Missing coordinates are written as `-1`. Groups without a start index are
//! skipped since there is nothing to restore for them.
//!
//! Names are written with `\uXXXX` escapes where they would not survive
//! parsing: backslashes, the `|` and `=` separators, leading whitespace
//! (trimmed by INI readers) and a leading quote.
//!
//! Properties live in the general section of a `rust-ini` document, so the
//! state can be stored next to other settings of the host application.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_groups::GroupModel;
//!
//! let mut model = GroupModel::new();
//! let id = model.add_group("Name", 0, 2);
//! model.add_static_indexes_to_group(id, &[1]);
//!
//! let text = model.save_to_string("table").unwrap();
//!
//! let mut restored = GroupModel::new();
//! restored.load_from_str("table", &text).unwrap();
//! assert_eq!(restored.group_by_name("Name").unwrap().static_indexes(), &[1]);
//! ```

use std::fmt;

use ini::Ini;

use crate::error::{GroupModelError, Result};
use crate::group::{DisplayIndex, Group};
use crate::logging::targets;
use crate::model::GroupModel;

const COLLAPSED: (&str, &str) = ("expanded", "collapsed");
const COLLAPSEABLE: (&str, &str) = ("uncollapseable", "collapseable");
const UNBREAKABLE: (&str, &str) = ("breakable", "unbreakable");

/// The persisted fields of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    pub start_index: Option<usize>,
    pub visible_start_index: Option<usize>,
    pub visible_start_position: Option<usize>,
    pub original_span: usize,
    pub visible_span: usize,
    pub collapsed: bool,
    pub collapseable: bool,
    pub unbreakable: bool,
    pub static_indexes: Vec<usize>,
}

impl GroupRecord {
    /// Captures the persisted fields of a group.
    pub fn from_group(group: &Group) -> Self {
        Self {
            name: group.name().to_string(),
            start_index: group.start_index(),
            visible_start_index: group.visible_start_index(),
            visible_start_position: group.visible_start_position(),
            original_span: group.original_span(),
            visible_span: group.visible_span(),
            collapsed: group.is_collapsed(),
            collapseable: group.is_collapseable(),
            unbreakable: group.is_unbreakable(),
            static_indexes: group.static_indexes().to_vec(),
        }
    }

    /// Parses a single `name=...` record.
    pub fn parse(record: &str) -> Result<Self> {
        let (name, state) = record
            .split_once('=')
            .ok_or_else(|| GroupModelError::MalformedRecord(record.to_string()))?;
        let name = unescape_name(name)
            .ok_or_else(|| GroupModelError::MalformedRecord(record.to_string()))?;

        let mut fields = state.split(':');
        let mut next = |field: &'static str| {
            fields
                .next()
                .ok_or_else(|| GroupModelError::missing_field(record, field))
        };

        let start_index = parse_coordinate("start_index", next("start_index")?)?;
        let visible_start_index =
            parse_coordinate("visible_start_index", next("visible_start_index")?)?;
        let visible_start_position =
            parse_coordinate("visible_start_position", next("visible_start_position")?)?;
        let original_span = parse_count("original_span", next("original_span")?)?;
        let visible_span = parse_count("visible_span", next("visible_span")?)?;
        let collapsed = parse_flag("collapsed", next("collapsed")?, COLLAPSED)?;
        let collapseable = parse_flag("collapseable", next("collapseable")?, COLLAPSEABLE)?;
        let unbreakable = parse_flag("unbreakable", next("unbreakable")?, UNBREAKABLE)?;

        if visible_span > original_span {
            return Err(GroupModelError::invalid_number(
                "visible_span",
                visible_span.to_string(),
            ));
        }
        for start in [start_index, visible_start_position].into_iter().flatten() {
            if start.checked_add(original_span).is_none() {
                return Err(GroupModelError::invalid_number(
                    "original_span",
                    original_span.to_string(),
                ));
            }
        }

        let static_indexes = match fields.next() {
            Some(statics) => statics
                .split(',')
                .filter(|token| !token.is_empty())
                .map(|token| parse_count("static_indexes", token))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            name,
            start_index,
            visible_start_index,
            visible_start_position,
            original_span,
            visible_span,
            collapsed,
            collapseable,
            unbreakable,
            static_indexes,
        })
    }
}

impl fmt::Display for GroupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}:{}:{}:{}:{}:{}:{}:{}",
            escape_name(&self.name),
            DisplayIndex(self.start_index),
            DisplayIndex(self.visible_start_index),
            DisplayIndex(self.visible_start_position),
            self.original_span,
            self.visible_span,
            literal(self.collapsed, COLLAPSED),
            literal(self.collapseable, COLLAPSEABLE),
            literal(self.unbreakable, UNBREAKABLE),
        )?;

        if !self.static_indexes.is_empty() {
            f.write_str(":")?;
            for index in &self.static_indexes {
                write!(f, "{index},")?;
            }
        }
        Ok(())
    }
}

/// Encodes groups into the persisted property value.
pub fn encode_groups<'a>(groups: impl IntoIterator<Item = &'a Group>) -> String {
    let mut value = String::new();
    for group in groups {
        if group.start_index().is_none() {
            continue;
        }
        value.push_str(&GroupRecord::from_group(group).to_string());
        value.push('|');
    }
    value
}

/// Decodes a persisted property value into its group records.
pub fn decode_groups(value: &str) -> Result<Vec<GroupRecord>> {
    value
        .split('|')
        .filter(|token| !token.is_empty())
        .map(GroupRecord::parse)
        .collect()
}

impl GroupModel {
    /// Writes the state of all groups into the general section of `properties`.
    pub fn save_state(&self, prefix: &str, properties: &mut Ini) {
        let key = self.config().property_key(prefix);
        let value = encode_groups(self.groups());
        tracing::debug!(
            target: targets::PERSISTENCE,
            %key,
            groups = self.len(),
            "saving group state"
        );
        properties.with_section(None::<String>).set(key, value);
    }

    /// Restores the groups saved under `prefix`.
    ///
    /// Does nothing if `properties` holds no state for the prefix. Otherwise
    /// the model is cleared and repopulated in record order. A corrupt value
    /// is reported before anything is cleared.
    pub fn load_state(&mut self, prefix: &str, properties: &Ini) -> Result<()> {
        let key = self.config().property_key(prefix);
        let Some(value) = properties.get_from(None::<String>, &key) else {
            return Ok(());
        };

        let records = decode_groups(value).inspect_err(|err| {
            tracing::warn!(
                target: targets::PERSISTENCE,
                %key,
                error = %err,
                "failed to decode group state"
            );
        })?;

        self.clear();
        for record in records {
            self.restore_record(record);
        }
        tracing::debug!(
            target: targets::PERSISTENCE,
            %key,
            groups = self.len(),
            "restored group state"
        );
        Ok(())
    }

    /// Renders the saved state as an INI document.
    pub fn save_to_string(&self, prefix: &str) -> Result<String> {
        let mut properties = Ini::new();
        self.save_state(prefix, &mut properties);

        let mut buffer = Vec::new();
        properties
            .write_to(&mut buffer)
            .map_err(|e| GroupModelError::Ini(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| GroupModelError::Ini(e.to_string()))
    }

    /// Restores the state from an INI document produced by
    /// [`save_to_string`](Self::save_to_string).
    pub fn load_from_str(&mut self, prefix: &str, content: &str) -> Result<()> {
        let properties = Ini::load_from_str(content)?;
        self.load_state(prefix, &properties)
    }

    fn restore_record(&mut self, record: GroupRecord) {
        let id = self.insert_group(record.name, record.start_index, record.original_span);
        let mapping = self.mapping().clone();
        let Some(group) = self.group_mut(id) else {
            return;
        };

        group.restore_visible_state(
            record.visible_start_index,
            record.visible_start_position,
            record.visible_span,
            &mapping,
        );
        group.set_collapseable(record.collapseable);
        group.set_collapsed(record.collapsed);
        group.set_unbreakable(record.unbreakable);
        for index in record.static_indexes {
            group.push_static_index(index);
        }
    }
}

fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    let mut leading = true;
    for (i, ch) in name.chars().enumerate() {
        leading &= ch.is_whitespace();
        let opens_quote = i == 0 && matches!(ch, '"' | '\'');
        if leading || opens_quote || matches!(ch, '\\' | '|' | '=') {
            escaped.push_str(&format!("\\u{:04x}", u32::from(ch)));
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

fn unescape_name(escaped: &str) -> Option<String> {
    let mut name = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            name.push(ch);
            continue;
        }
        if chars.next() != Some('u') {
            return None;
        }
        let code: String = chars.by_ref().take(4).collect();
        if code.len() != 4 {
            return None;
        }
        name.push(char::from_u32(u32::from_str_radix(&code, 16).ok()?)?);
    }
    Some(name)
}

fn literal(value: bool, (when_false, when_true): (&'static str, &'static str)) -> &'static str {
    if value { when_true } else { when_false }
}

fn parse_flag(
    field: &'static str,
    value: &str,
    expected: (&'static str, &'static str),
) -> Result<bool> {
    if value == expected.1 {
        Ok(true)
    } else if value == expected.0 {
        Ok(false)
    } else {
        Err(GroupModelError::invalid_state(field, value, expected))
    }
}

fn parse_coordinate(field: &'static str, value: &str) -> Result<Option<usize>> {
    let number: i64 = value
        .trim()
        .parse()
        .map_err(|_| GroupModelError::invalid_number(field, value))?;
    Ok(usize::try_from(number).ok())
}

fn parse_count(field: &'static str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| GroupModelError::invalid_number(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> GroupModel {
        let mut model = GroupModel::new();
        let a = model.add_group("A", 0, 3);
        model.add_static_indexes_to_group(a, &[2, 0]);
        model.set_group_collapsed(a, true);

        let b = model.add_group("B", 4, 2);
        model.set_group_collapseable(b, false);
        model.set_group_unbreakable(b, true);
        model
    }

    #[test]
    fn test_encode_format() {
        let model = sample_model();
        assert_eq!(
            encode_groups(model.groups()),
            "A=0:0:0:3:3:collapsed:collapseable:breakable:2,0,|\
             B=4:4:4:2:2:expanded:uncollapseable:unbreakable|"
        );
    }

    #[test]
    fn test_encode_skips_groups_without_start() {
        let mut model = GroupModel::new();
        let id = model.add_group("A", 0, 1);
        model.add_group("B", 1, 1);
        model.group_mut(id).unwrap().set_start_index(None);

        assert_eq!(encode_groups(model.groups()), "B=1:1:1:1:1:expanded:collapseable:breakable|");
    }

    #[test]
    fn test_decode_negative_coordinates() {
        let records = decode_groups("X=3:-1:-1:2:0:expanded:collapseable:breakable|").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].start_index, Some(3));
        assert_eq!(records[0].visible_start_index, None);
        assert_eq!(records[0].visible_start_position, None);
        assert_eq!(records[0].visible_span, 0);
        assert_eq!(records[0].to_string(), "X=3:-1:-1:2:0:expanded:collapseable:breakable");
    }

    #[test]
    fn test_decode_rejects_unknown_literals() {
        let err = decode_groups("A=0:0:0:1:1:folded:collapseable:breakable|").unwrap_err();
        assert_eq!(
            err,
            GroupModelError::invalid_state("collapsed", "folded", COLLAPSED)
        );

        let err = decode_groups("A=0:0:0:1:1:expanded:yes:breakable|").unwrap_err();
        assert!(matches!(err, GroupModelError::InvalidState { field: "collapseable", .. }));

        let err = decode_groups("A=0:0:0:1:1:expanded:collapseable:solid|").unwrap_err();
        assert!(matches!(err, GroupModelError::InvalidState { field: "unbreakable", .. }));
    }

    #[test]
    fn test_decode_malformed_records() {
        assert!(matches!(
            decode_groups("no separator|").unwrap_err(),
            GroupModelError::MalformedRecord(_)
        ));
        assert!(matches!(
            decode_groups("A=0:0:0:1|").unwrap_err(),
            GroupModelError::MissingField { field: "visible_span", .. }
        ));
        assert!(matches!(
            decode_groups("A=x:0:0:1:1:expanded:collapseable:breakable|").unwrap_err(),
            GroupModelError::InvalidNumber { field: "start_index", .. }
        ));
    }

    #[test]
    fn test_decode_rejects_inconsistent_spans() {
        let err = decode_groups(
            "A=1:1:1:18446744073709551615:0:expanded:collapseable:breakable|",
        )
        .unwrap_err();
        assert!(matches!(err, GroupModelError::InvalidNumber { field: "original_span", .. }));

        let err = decode_groups("A=0:0:0:1:2:expanded:collapseable:breakable|").unwrap_err();
        assert!(matches!(err, GroupModelError::InvalidNumber { field: "visible_span", .. }));

        let mut model = sample_model();
        let result = model.load_from_str(
            "t",
            "t.groupModel=A=1:1:1:18446744073709551615:0:expanded:collapseable:breakable|\n",
        );
        assert!(result.is_err());
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn test_names_are_escaped() {
        let mut model = GroupModel::new();
        model.add_group(" Padded", 0, 2);
        model.add_group("a|b=c\\d", 2, 1);
        model.add_group("Two Words ", 3, 1);
        model.add_group("\"Quoted\"", 4, 1);

        let value = encode_groups(model.groups());
        assert!(value.starts_with("\\u0020Padded=0:"));
        assert!(value.contains("|a\\u007cb\\u003dc\\u005cd=2:"));
        assert!(value.contains("|Two Words =3:"));
        assert!(value.contains("|\\u0022Quoted\"=4:"));

        let text = model.save_to_string("t").unwrap();
        let mut restored = GroupModel::new();
        restored.load_from_str("t", &text).unwrap();

        let names: Vec<_> = restored.groups().map(|g| g.name().to_string()).collect();
        assert_eq!(names, vec![" Padded", "a|b=c\\d", "Two Words ", "\"Quoted\""]);
    }

    #[test]
    fn test_decode_rejects_bad_escapes() {
        let records = [
            "A\\x=0:0:0:1:1:expanded:collapseable:breakable|",
            "A\\u00=0:0:0:1:1:expanded:collapseable:breakable|",
        ];
        for record in records {
            assert!(matches!(
                decode_groups(record).unwrap_err(),
                GroupModelError::MalformedRecord(_)
            ));
        }
    }

    #[test]
    fn test_roundtrip_through_ini() {
        let model = sample_model();
        let mut properties = Ini::new();
        model.save_state("table", &mut properties);
        assert!(properties.get_from(None::<String>, "table.groupModel").is_some());

        let mut restored = GroupModel::new();
        restored.add_group("stale", 9, 1);
        restored.load_state("table", &properties).unwrap();

        let before: Vec<_> = model.groups().map(GroupRecord::from_group).collect();
        let after: Vec<_> = restored.groups().map(GroupRecord::from_group).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_load_missing_key_keeps_model() {
        let mut model = sample_model();
        model.load_state("other", &Ini::new()).unwrap();
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn test_failed_load_keeps_model() {
        let mut model = sample_model();
        let mut properties = Ini::new();
        properties
            .with_section(None::<String>)
            .set("table.groupModel", "A=0:0:0:1:1:open:collapseable:breakable|");

        assert!(model.load_state("table", &properties).is_err());
        assert_eq!(model.len(), 2);
    }
}
