//! Live session state
//!
//! A [`Session`] exists only while the search UI is open. It owns the ids of
//! every surface the controller created, in creation order, plus the small
//! amount of state that survives between commands: search mode, query,
//! displayed results and the device picker.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::host::SurfaceId;

use super::types::{Device, Direction, ResultRow, SearchMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    Anchor,
    Placeholder,
    NowPlaying,
    Devices,
    Input,
    Results,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceRecord {
    pub kind: SurfaceKind,
    pub order: u64,
}

#[derive(Debug, Default)]
pub struct Session {
    surfaces: BTreeMap<SurfaceId, SurfaceRecord>,
    next_order: u64,
    anchor: Option<SurfaceId>,
    pub mode: SearchMode,
    pub query: String,
    results: Vec<ResultRow>,
    result_cursor: Option<usize>,
    devices: Vec<Device>,
    selected_device: Option<usize>,
    pub last_error: Option<String>,
}

/// Step `current` one position in `direction` over `len` entries, wrapping at
/// both ends. Starts from 0 when nothing is selected; `None` for an empty list.
pub fn cycle_index(current: Option<usize>, len: usize, direction: Direction) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let start = current.unwrap_or(0) as isize;
    Some((start + direction.delta()).rem_euclid(len as isize) as usize)
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // Surfaces

    /// Record a freshly created surface. Every kind is a singleton per session.
    pub fn track(&mut self, id: SurfaceId, kind: SurfaceKind) {
        debug_assert!(
            self.surface_of(kind).is_none(),
            "{kind:?} surface tracked twice"
        );
        let order = self.next_order;
        self.next_order += 1;
        self.surfaces.insert(id, SurfaceRecord { kind, order });
        if kind == SurfaceKind::Anchor {
            self.anchor = Some(id);
        }
    }

    pub fn forget(&mut self, id: SurfaceId) -> Option<SurfaceRecord> {
        if self.anchor == Some(id) {
            self.anchor = None;
        }
        self.surfaces.remove(&id)
    }

    pub fn anchor(&self) -> Option<SurfaceId> {
        self.anchor
    }

    pub fn surface_of(&self, kind: SurfaceKind) -> Option<SurfaceId> {
        self.surfaces
            .iter()
            .find(|(_, record)| record.kind == kind)
            .map(|(id, _)| *id)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Newest first, with the anchor always last since everything else hangs off it.
    pub fn teardown_order(&self) -> Vec<SurfaceId> {
        let mut records: Vec<_> = self.surfaces.iter().collect();
        records.sort_by_key(|(_, record)| {
            (record.kind == SurfaceKind::Anchor, Reverse(record.order))
        });
        records.into_iter().map(|(id, _)| *id).collect()
    }

    // Results

    pub fn results(&self) -> &[ResultRow] {
        &self.results
    }

    pub fn result_cursor(&self) -> Option<usize> {
        self.result_cursor
    }

    pub fn selected_result(&self) -> Option<&ResultRow> {
        self.result_cursor.and_then(|i| self.results.get(i))
    }

    /// Replace the displayed rows and put the cursor on the first one.
    pub fn replace_results(&mut self, rows: Vec<ResultRow>) {
        self.result_cursor = if rows.is_empty() { None } else { Some(0) };
        self.results = rows;
    }

    /// Returns the new cursor, or `None` when there is nothing to move over.
    pub fn move_cursor(&mut self, direction: Direction) -> Option<usize> {
        let next = cycle_index(self.result_cursor, self.results.len(), direction)?;
        self.result_cursor = Some(next);
        Some(next)
    }

    // Devices

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn selected_device_index(&self) -> Option<usize> {
        self.selected_device
    }

    pub fn selected_device(&self) -> Option<&Device> {
        self.selected_device.and_then(|i| self.devices.get(i))
    }

    /// The id to hand to `play`; an empty id counts as no selection.
    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected_device()
            .map(|device| device.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Install a fresh device list, keeping the selection only if the
    /// selected device is still present.
    pub fn replace_devices(&mut self, devices: Vec<Device>) {
        let selected_id = self.selected_device().map(|device| device.id.clone());
        self.selected_device =
            selected_id.and_then(|id| devices.iter().position(|device| device.id == id));
        self.devices = devices;
    }

    pub fn select_device(&mut self, direction: Direction) -> Option<usize> {
        let next = cycle_index(self.selected_device, self.devices.len(), direction)?;
        self.selected_device = Some(next);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str) -> Device {
        Device {
            name: name.to_string(),
            id: format!("{}-id", name.to_lowercase()),
            is_active: false,
        }
    }

    #[test]
    fn cycle_wraps_both_ways() {
        for k in 1..6 {
            for start in 0..k {
                let mut i = Some(start);
                for _ in 0..k {
                    i = cycle_index(i, k, Direction::Next);
                }
                assert_eq!(i, Some(start));
            }
            assert_eq!(cycle_index(Some(0), k, Direction::Previous), Some(k - 1));
        }
    }

    #[test]
    fn cycle_on_empty_list_is_noop() {
        assert_eq!(cycle_index(None, 0, Direction::Next), None);
        let mut session = Session::new();
        assert_eq!(session.select_device(Direction::Previous), None);
        assert_eq!(session.selected_device_index(), None);
    }

    #[test]
    fn next_from_nothing_selects_second() {
        let mut session = Session::new();
        session.replace_devices(vec![device("Kitchen"), device("Office")]);
        assert_eq!(session.select_device(Direction::Next), Some(1));
        assert_eq!(session.selected_device_id(), Some("office-id"));
    }

    #[test]
    fn replacing_devices_keeps_selection_by_id() {
        let mut session = Session::new();
        session.replace_devices(vec![device("Kitchen"), device("Office")]);
        session.select_device(Direction::Next);

        session.replace_devices(vec![device("Office"), device("Den"), device("Kitchen")]);
        assert_eq!(session.selected_device_index(), Some(0));

        session.replace_devices(vec![device("Den")]);
        assert_eq!(session.selected_device_index(), None);
    }

    #[test]
    fn empty_device_id_counts_as_unselected() {
        let mut session = Session::new();
        session.replace_devices(vec![Device {
            name: "Restricted".to_string(),
            id: String::new(),
            is_active: true,
        }]);
        session.select_device(Direction::Next);
        assert_eq!(session.selected_device_index(), Some(0));
        assert_eq!(session.selected_device_id(), None);
    }

    #[test]
    fn teardown_puts_anchor_last() {
        let mut session = Session::new();
        session.track(SurfaceId(10), SurfaceKind::Anchor);
        session.track(SurfaceId(3), SurfaceKind::Placeholder);
        session.track(SurfaceId(7), SurfaceKind::Input);
        session.track(SurfaceId(1), SurfaceKind::Results);

        assert_eq!(
            session.teardown_order(),
            vec![SurfaceId(1), SurfaceId(7), SurfaceId(3), SurfaceId(10)]
        );

        session.forget(SurfaceId(10));
        assert_eq!(session.anchor(), None);
        assert_eq!(session.surface_count(), 3);
    }

    #[test]
    fn results_cursor_follows_replacement() {
        let mut session = Session::new();
        assert_eq!(session.move_cursor(Direction::Next), None);

        let row = |name: &str| ResultRow {
            primary_text: name.to_string(),
            secondary_text: String::new(),
            uri: format!("spotify:track:{name}"),
            id: name.to_string(),
        };
        session.replace_results(vec![row("a"), row("b")]);
        assert_eq!(session.result_cursor(), Some(0));
        assert_eq!(session.move_cursor(Direction::Previous), Some(1));
        assert_eq!(session.selected_result().map(|r| r.id.as_str()), Some("b"));

        session.replace_results(Vec::new());
        assert_eq!(session.result_cursor(), None);
    }
}
