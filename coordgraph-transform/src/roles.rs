use coordgraph_common::{ArrayError, BinnedVariable, Bins, Coords, DataArray, Variable};
use indexmap::IndexSet;
use tracing::trace;

use crate::error::{Result, TransformError};

/// Dense and event halves of one name; either may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordPair {
    pub dense: Option<Variable>,
    pub event: Option<BinnedVariable>,
}

impl CoordPair {
    pub fn is_empty(&self) -> bool {
        self.dense.is_none() && self.event.is_none()
    }
}

/// Private working copy of the array a transformation writes into.
///
/// Taken once at entry as a shallow copy: value buffers are shared with
/// the caller, namespaces are not. The event buffer is detached before
/// the first nested write and the detachment is remembered.
#[derive(Debug)]
pub(crate) struct ArraySnapshot {
    obj: DataArray,
    bins_independent: bool,
}

impl ArraySnapshot {
    pub fn new(obj: &DataArray) -> Self {
        Self {
            obj: obj.copy(false),
            bins_independent: false,
        }
    }

    pub fn array(&self) -> &DataArray {
        &self.obj
    }

    pub fn into_inner(self) -> DataArray {
        self.obj
    }

    /// Replace the working array, e.g. after renaming dimensions.
    pub fn replace(&mut self, obj: DataArray) {
        self.obj = obj;
    }

    /// All names currently known, dense or nested, in either role.
    pub fn names(&self) -> IndexSet<String> {
        let mut names: IndexSet<String> = self.obj.coords().names().into_iter().collect();
        names.extend(self.obj.attrs().names());
        if let Some(bins) = self.obj.bins() {
            names.extend(bins.coords().names());
            names.extend(bins.attrs().names());
        }
        names
    }

    /// Names currently in the coordinate role, dense or nested.
    pub fn coord_names(&self) -> IndexSet<String> {
        let mut names: IndexSet<String> = self.obj.coords().names().into_iter().collect();
        if let Some(bins) = self.obj.bins() {
            names.extend(bins.coords().names());
        }
        names
    }

    pub fn exists(&self, name: &str) -> bool {
        self.obj.contains_any(name)
    }

    pub fn in_attrs(&self, name: &str) -> bool {
        self.obj.attrs().contains(name)
            || self.obj.bins().is_some_and(|bins| bins.attrs().contains(name))
    }

    /// Current value of `name` without changing its role.
    pub fn read(&self, name: &str) -> CoordPair {
        trace!(name, "read");
        CoordPair {
            dense: self
                .obj
                .coords()
                .get(name)
                .or_else(|| self.obj.attrs().get(name))
                .cloned(),
            event: self.obj.bins().and_then(|bins| bins.event_value(name)),
        }
    }

    /// Move `name` from the coordinate to the attribute role, dense and
    /// nested. Absence in either namespace is not an error.
    pub fn consume(&mut self, name: &str) -> Result<CoordPair> {
        self.move_role(name, Role::Attribute)?;
        Ok(self.read(name))
    }

    /// Move `name` from the attribute to the coordinate role, dense and
    /// nested. Absence in either namespace is not an error.
    pub fn produce(&mut self, name: &str) -> Result<CoordPair> {
        self.move_role(name, Role::Coordinate)?;
        Ok(self.read(name))
    }

    fn move_role(&mut self, name: &str, to: Role) -> Result<()> {
        let (coords, attrs) = self.obj.namespaces_mut();
        to.move_between(name, coords, attrs)?;

        if self.is_nested(name) {
            if let Some(bins) = self.bins_mut() {
                let (coords, attrs) = bins.buffer_mut().namespaces_mut();
                to.move_between(name, coords, attrs)?;
            }
        }
        Ok(())
    }

    pub fn store_dense(&mut self, name: &str, var: Variable) -> Result<()> {
        self.obj.set_coord(name, var)?;
        Ok(())
    }

    pub fn store_event(&mut self, name: &str, value: BinnedVariable) -> Result<()> {
        let array_name = self.obj.name().to_string();
        let bins = self.bins_mut().ok_or_else(|| {
            TransformError::Array(ArrayError::NotBinned(array_name))
        })?;
        bins.store_event(name, value)?;
        Ok(())
    }

    pub fn remove_any(&mut self, name: &str) {
        if self.is_nested(name) {
            self.ensure_bins_independent();
        }
        self.obj.remove_any(name);
    }

    /// Whether `name` has an event half, in either role.
    fn is_nested(&self, name: &str) -> bool {
        self.obj
            .bins()
            .is_some_and(|bins| bins.coords().contains(name) || bins.attrs().contains(name))
    }

    /// Bins of the working array, with the event buffer detached from the
    /// caller's before the first nested write.
    fn bins_mut(&mut self) -> Option<&mut Bins> {
        self.ensure_bins_independent();
        self.obj.bins_mut()
    }

    fn ensure_bins_independent(&mut self) {
        if self.bins_independent {
            return;
        }
        if let Some(bins) = self.obj.bins_mut() {
            bins.make_independent();
            self.bins_independent = true;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Coordinate,
    Attribute,
}

impl Role {
    fn move_between(self, name: &str, coords: &mut Coords, attrs: &mut Coords) -> Result<()> {
        let (from, to) = match self {
            Role::Coordinate => (attrs, coords),
            Role::Attribute => (coords, attrs),
        };
        let Some(var) = from.pop(name) else {
            return Ok(());
        };
        if to.get(name).is_some_and(|existing| existing != &var) {
            from.insert(name, var);
            return Err(TransformError::CoordCollision(format!(
                "`{name}` exists as both coordinate and attribute with different values"
            )));
        }
        to.insert(name, var);
        Ok(())
    }
}
