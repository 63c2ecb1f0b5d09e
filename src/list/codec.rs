//! Conversion between a placeholder list and a `PlaceholderMap`
//!
//! Every entry that has placeholders, or whose panel the converter could
//! describe, becomes one record. Live panels are handed to an `ItemConverter`
//! so the host decides what it takes to rebuild them.

use std::collections::BTreeSet;

use crate::convert::{ConvertedItem, ItemConverter, StrategyConverter};
use crate::error::ListError;
use crate::list::item::{Item, MetaMap};
use crate::list::{Level, PlaceholderList};
use crate::map::{attr, PlaceholderMap, Value};
use crate::panel::PlaceholderListItem;
use crate::placeholder::Placeholder;

/// Format tag of maps written by a placeholder list
pub const FORMAT: &str = "dock.PlaceholderList";

/// Current version of the map layout
pub const VERSION: u32 = 0;

/// One record, fully decoded but not yet part of the list
struct Decoded<D> {
    placeholders: BTreeSet<Placeholder>,
    value: Option<D>,
    child_map: Option<PlaceholderMap>,
    metadata: MetaMap,
}

impl<D: PlaceholderListItem> PlaceholderList<D> {
    /// Write this list, describing live panels with `converter`
    ///
    /// Placeholders the strategy invalidated but the list did not apply yet
    /// are left out.
    pub fn to_map<C>(&self, converter: &mut C) -> PlaceholderMap
    where
        C: ItemConverter<D> + ?Sized,
    {
        let mut map = PlaceholderMap::new(FORMAT, VERSION);
        let mut panel_index = 0;

        for item in self.iter(Level::Base) {
            let converted = item
                .value()
                .and_then(|value| converter.describe(panel_index, value));
            if !item.is_placeholder() {
                panel_index += 1;
            }

            let mut placeholders: Vec<Placeholder> = item
                .placeholders()
                .iter()
                .filter(|p| !self.inbox.contains(p))
                .cloned()
                .collect();
            if let Some(extra) = converted.as_ref().and_then(ConvertedItem::placeholder) {
                if !item.has_placeholder(extra) && !self.inbox.contains(extra) {
                    placeholders.push(extra.clone());
                }
            }

            if placeholders.is_empty() && converted.is_none() {
                continue;
            }

            let record = map.push_record(placeholders);
            let child_map = item
                .child_map()
                .or_else(|| converted.as_ref().and_then(ConvertedItem::child_map));
            if let Some(child_map) = child_map {
                map.put(record, attr::MAP, child_map.clone());
            }

            if let Some(converted) = &converted {
                map.put(record, attr::CONVERT, true);
                map.put(record, attr::CONVERT_KEYS, Value::strings(converted.keys()));
                for key in converted.keys() {
                    if let Some(value) = converted.get(key) {
                        map.put(
                            record,
                            format!("{}{}", attr::CONVERT_PREFIX, key),
                            value.clone(),
                        );
                    }
                }
            }

            let metadata = item.metadata();
            if !metadata.is_empty() {
                map.put(record, attr::ITEM, true);
                map.put(record, attr::ITEM_KEYS, Value::strings(metadata.keys().cloned()));
                for (key, value) in metadata {
                    map.put(record, format!("{}{}", attr::ITEM_PREFIX, key), value.clone());
                }
            }
        }

        tracing::debug!(
            "Wrote placeholder list with {} entries into {} records",
            self.len(),
            map.len()
        );
        map
    }

    /// Write this list, replacing live panels by their strategy placeholder
    pub fn to_map_with_strategy(&self) -> PlaceholderMap {
        self.to_map(&mut StrategyConverter::new(self.strategy.clone()))
    }

    /// Persist the current layout
    ///
    /// Unless disabled in the config, every live panel first records its
    /// strategy placeholder so the layout survives the panel going away.
    pub fn snapshot(&mut self) -> PlaceholderMap {
        if self.config.snapshot_live_placeholders {
            self.insert_all_placeholders();
        } else {
            self.apply_invalidations();
        }
        self.to_map_with_strategy()
    }

    /// Append the entries stored in `map` to this list
    ///
    /// The whole map is decoded before the list is touched, a malformed
    /// record leaves the list as it was. Records naming neither a
    /// placeholder nor a rebuilt panel are skipped. `on_reconstructed` runs
    /// for every rebuilt panel once all entries are in place.
    pub fn read<C>(&mut self, map: &PlaceholderMap, converter: &mut C) -> Result<(), ListError>
    where
        C: ItemConverter<D> + ?Sized,
    {
        let decoded = decode(map, converter)?;
        self.apply_invalidations();

        let mut added = Vec::new();
        let mut skipped = 0;
        for record in decoded {
            let Decoded {
                placeholders,
                value,
                child_map,
                metadata,
            } = record;

            let mut item = match value {
                Some(value) => {
                    added.push(value.clone());
                    Item::panel_with(value, placeholders.clone(), child_map)
                }
                None => match Item::placeholder(placeholders.clone()) {
                    Ok(mut item) => {
                        item.set_child_map(child_map);
                        item
                    }
                    Err(_) => {
                        skipped += 1;
                        continue;
                    }
                },
            };
            *item.metadata_mut() = metadata;

            let key = self.insert_after(self.tail(), item);
            self.prune(&placeholders, Some(key));
        }

        if skipped > 0 {
            tracing::debug!("Skipped {} records without placeholders", skipped);
        }
        for value in &added {
            converter.on_reconstructed(value);
        }
        if self.bound {
            self.check_all_placeholders();
        }

        tracing::debug!(
            "Read {} records, {} panels rebuilt",
            map.len(),
            added.len()
        );
        Ok(())
    }

    /// Make every converter call `read` would make, without building a list
    pub fn simulated_read<C>(map: &PlaceholderMap, converter: &mut C) -> Result<(), ListError>
    where
        C: ItemConverter<D> + ?Sized,
    {
        for record in decode(map, converter)? {
            if let Some(value) = &record.value {
                converter.on_reconstructed(value);
            }
        }
        Ok(())
    }

    /// A new list holding the placeholders of `map`, no panel is rebuilt
    pub fn from_map(map: &PlaceholderMap) -> Result<Self, ListError> {
        Self::from_map_with(map, &mut StrategyConverter::new(None))
    }

    /// A new list holding the entries of `map`
    pub fn from_map_with<C>(map: &PlaceholderMap, converter: &mut C) -> Result<Self, ListError>
    where
        C: ItemConverter<D> + ?Sized,
    {
        let mut list = Self::new();
        list.read(map, converter)?;
        Ok(list)
    }
}

fn decode<D, C>(map: &PlaceholderMap, converter: &mut C) -> Result<Vec<Decoded<D>>, ListError>
where
    C: ItemConverter<D> + ?Sized,
{
    if map.format() != FORMAT {
        return Err(ListError::UnknownFormat(map.format().to_string()));
    }
    if map.version() != VERSION {
        return Err(ListError::UnknownVersion(map.version()));
    }

    let mut decoded = Vec::with_capacity(map.len());
    for (index, record) in map.records().iter().enumerate() {
        let value = if map.contains(index, attr::CONVERT) {
            let converted = prefixed_entries(map, index, attr::CONVERT_KEYS, attr::CONVERT_PREFIX)?;
            let mut item = ConvertedItem::new();
            for (key, value) in converted {
                item.put(key, value);
            }
            converter.reconstruct(&item)
        } else {
            None
        };

        let child_map = match map.get(index, attr::MAP) {
            None => None,
            Some(Value::Map(child)) => Some(child.clone()),
            Some(_) => return Err(ListError::malformed(index, "map is not a placeholder map")),
        };

        let metadata = if map.contains(index, attr::ITEM) {
            prefixed_entries(map, index, attr::ITEM_KEYS, attr::ITEM_PREFIX)?
        } else {
            MetaMap::new()
        };

        decoded.push(Decoded {
            placeholders: record.placeholders.iter().cloned().collect(),
            value,
            child_map,
            metadata,
        });
    }
    Ok(decoded)
}

/// Collect the values listed by a `*-keys` attribute
fn prefixed_entries(
    map: &PlaceholderMap,
    index: usize,
    keys_attr: &str,
    prefix: &str,
) -> Result<MetaMap, ListError> {
    let keys = map
        .get_strings(index, keys_attr)
        .ok_or_else(|| ListError::malformed(index, format!("{keys_attr} missing or not a string array")))?;

    let mut entries = MetaMap::new();
    for key in keys {
        let attribute = format!("{prefix}{key}");
        let value = map
            .get(index, &attribute)
            .ok_or_else(|| ListError::malformed(index, format!("{attribute} missing")))?;
        entries.insert(key, value.clone());
    }
    Ok(entries)
}
