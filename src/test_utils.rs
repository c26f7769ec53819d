//! In-memory surface host for controller tests

use std::collections::{BTreeMap, HashMap};

use crate::host::{
    Geometry, KeyMode, NotifyLevel, OptionValue, SurfaceError, SurfaceHost, SurfaceId,
    splice_region,
};
use crate::model::Command;

#[derive(Debug, Default)]
pub struct FakeSurface {
    pub lines: Vec<String>,
    pub options: HashMap<String, OptionValue>,
    pub placement: Option<(Option<SurfaceId>, Geometry)>,
    pub keymaps: HashMap<(KeyMode, String), Command>,
    pub on_leave: Option<Command>,
}

#[derive(Debug, Default)]
pub struct FakeHost {
    pub surfaces: BTreeMap<SurfaceId, FakeSurface>,
    pub destroyed: Vec<SurfaceId>,
    pub host_commands: Vec<String>,
    pub notifications: Vec<(NotifyLevel, String)>,
    next_id: u64,
    creations: usize,
    fail_creation_at: Option<usize>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose `n`th surface creation (zero-based) fails.
    pub fn failing_creation_at(n: usize) -> Self {
        Self {
            fail_creation_at: Some(n),
            ..Self::default()
        }
    }

    /// The surface that took focus when it was placed
    pub fn focused(&self) -> Option<SurfaceId> {
        self.surfaces
            .iter()
            .filter(|(_, s)| s.placement.is_some_and(|(_, g)| g.enter))
            .map(|(id, _)| *id)
            .last()
    }

    /// Simulate typing into the focused surface.
    pub fn type_text(&mut self, text: &str) {
        if let Some(id) = self.focused() {
            if let Some(surface) = self.surfaces.get_mut(&id) {
                surface.lines = vec![text.to_string()];
            }
        }
    }

    pub fn key(&self, id: SurfaceId, mode: KeyMode, key: &str) -> Option<&Command> {
        self.surfaces
            .get(&id)
            .and_then(|s| s.keymaps.get(&(mode, key.to_string())))
    }

    pub fn lines_of(&self, id: SurfaceId) -> &[String] {
        self.surfaces.get(&id).map_or(&[], |s| s.lines.as_slice())
    }

    pub fn option(&self, id: SurfaceId, key: &str) -> Option<&OptionValue> {
        self.surfaces.get(&id).and_then(|s| s.options.get(key))
    }

    pub fn last_error(&self) -> Option<&str> {
        self.notifications
            .iter()
            .rev()
            .find(|(level, _)| *level == NotifyLevel::Error)
            .map(|(_, message)| message.as_str())
    }

    fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut FakeSurface, SurfaceError> {
        self.surfaces.get_mut(&id).ok_or(SurfaceError::NotFound(id))
    }
}

impl SurfaceHost for FakeHost {
    fn create_surface(&mut self) -> Result<SurfaceId, SurfaceError> {
        let attempt = self.creations;
        self.creations += 1;
        if self.fail_creation_at == Some(attempt) {
            return Err(SurfaceError::CreationFailed(format!(
                "injected failure on creation {attempt}"
            )));
        }

        self.next_id += 1;
        let id = SurfaceId(self.next_id);
        self.surfaces.insert(id, FakeSurface::default());
        Ok(id)
    }

    fn destroy_surface(&mut self, id: SurfaceId) -> Result<(), SurfaceError> {
        self.surfaces.remove(&id).ok_or(SurfaceError::NotFound(id))?;
        self.destroyed.push(id);
        Ok(())
    }

    fn write_lines(&mut self, id: SurfaceId, lines: &[String]) -> Result<(), SurfaceError> {
        self.surface_mut(id)?.lines = lines.to_vec();
        Ok(())
    }

    fn write_region(
        &mut self,
        id: SurfaceId,
        row: usize,
        col_start: usize,
        col_end: usize,
        text: &str,
    ) -> Result<(), SurfaceError> {
        splice_region(&mut self.surface_mut(id)?.lines, row, col_start, col_end, text);
        Ok(())
    }

    fn set_option(
        &mut self,
        id: SurfaceId,
        key: &str,
        value: OptionValue,
    ) -> Result<(), SurfaceError> {
        self.surface_mut(id)?.options.insert(key.to_string(), value);
        Ok(())
    }

    fn open_floating(
        &mut self,
        id: SurfaceId,
        anchor: Option<SurfaceId>,
        geometry: Geometry,
    ) -> Result<(), SurfaceError> {
        if let Some(anchor) = anchor {
            if !self.surfaces.contains_key(&anchor) {
                return Err(SurfaceError::NotFound(anchor));
            }
        }
        self.surface_mut(id)?.placement = Some((anchor, geometry));
        Ok(())
    }

    fn bind_key(
        &mut self,
        id: SurfaceId,
        mode: KeyMode,
        key: &str,
        command: Command,
    ) -> Result<(), SurfaceError> {
        self.surface_mut(id)?
            .keymaps
            .insert((mode, key.to_string()), command);
        Ok(())
    }

    fn bind_leave(&mut self, id: SurfaceId, command: Command) -> Result<(), SurfaceError> {
        self.surface_mut(id)?.on_leave = Some(command);
        Ok(())
    }

    fn read_line(&self, id: SurfaceId, row: usize) -> Result<String, SurfaceError> {
        let surface = self.surfaces.get(&id).ok_or(SurfaceError::NotFound(id))?;
        Ok(surface.lines.get(row).cloned().unwrap_or_default())
    }

    fn run_host_command(&mut self, command: &str) -> Result<(), SurfaceError> {
        self.host_commands.push(command.to_string());
        Ok(())
    }

    fn screen_size(&self) -> (u16, u16) {
        (120, 40)
    }

    fn notify(&mut self, level: NotifyLevel, message: &str) {
        self.notifications.push((level, message.to_string()));
    }
}
