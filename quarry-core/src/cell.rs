use crate::{AsValue, Result, Value};
use std::{
    borrow::Cow,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

/// Receives a notification each time a dirty member is committed.
pub trait ChangeListener: Send + Sync {
    fn property_changed(&self, property: &str);
}

/// Committed/uncommitted value pair of one entity member.
///
/// States are Clean (`uncommitted == committed`) and Dirty. Only [`FieldCell::commit`] and
/// [`FieldCell::rollback`] (or assigning back the committed value) return a cell to Clean.
/// Not internally synchronized: one writer per entity instance.
///
/// ```rust
/// use quarry_core::FieldCell;
/// let mut salary = FieldCell::new(1000.0);
/// salary.set(1200.0);
/// assert!(salary.is_changed());
/// assert!(salary.commit());
/// assert_eq!(*salary.committed(), 1200.0);
/// assert!(!salary.rollback());
/// ```
#[derive(Default)]
pub struct FieldCell<T> {
    committed: T,
    uncommitted: T,
    listener: Option<(Cow<'static, str>, Arc<dyn ChangeListener>)>,
}

impl<T: Clone + PartialEq> FieldCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            committed: value.clone(),
            uncommitted: value,
            listener: None,
        }
    }

    /// Registers the listener notified by `commit` under the given property name.
    pub fn subscribe(
        &mut self,
        property: impl Into<Cow<'static, str>>,
        listener: Arc<dyn ChangeListener>,
    ) {
        self.listener = Some((property.into(), listener));
    }

    /// Current (uncommitted) value.
    pub fn get(&self) -> &T {
        &self.uncommitted
    }

    pub fn committed(&self) -> &T {
        &self.committed
    }

    pub fn set(&mut self, value: T) {
        self.uncommitted = value;
    }

    pub fn is_changed(&self) -> bool {
        self.uncommitted != self.committed
    }

    /// Promotes the uncommitted value. Returns whether the cell was dirty, in which case the
    /// listener received exactly one notification.
    pub fn commit(&mut self) -> bool {
        if !self.is_changed() {
            return false;
        }
        self.committed = self.uncommitted.clone();
        if let Some((property, listener)) = &self.listener {
            listener.property_changed(property);
        }
        true
    }

    /// Reverts to the committed value. Returns whether the cell was dirty.
    pub fn rollback(&mut self) -> bool {
        if !self.is_changed() {
            return false;
        }
        self.uncommitted = self.committed.clone();
        true
    }

    /// Overwrites both sides with a value read from the database.
    pub fn load(&mut self, value: T) {
        self.committed = value.clone();
        self.uncommitted = value;
    }
}

impl<T: Clone> Clone for FieldCell<T> {
    fn clone(&self) -> Self {
        Self {
            committed: self.committed.clone(),
            uncommitted: self.uncommitted.clone(),
            listener: self.listener.clone(),
        }
    }
}

impl<T: Debug> Debug for FieldCell<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCell")
            .field("committed", &self.committed)
            .field("uncommitted", &self.uncommitted)
            .finish()
    }
}

/// Object safe view of a [`FieldCell`], used by the mapping layer to read and write members
/// without knowing their Rust type.
pub trait TrackedField: Send + Sync {
    /// Uncommitted value.
    fn value(&self) -> Value;
    fn committed_value(&self) -> Value;
    fn set_value(&mut self, value: Value) -> Result<()>;
    fn is_changed(&self) -> bool;
    fn commit(&mut self) -> bool;
    fn rollback(&mut self) -> bool;
    /// Sets both sides without notification.
    fn load(&mut self, value: Value) -> Result<()>;
}

impl<T> TrackedField for FieldCell<T>
where
    T: AsValue + Clone + PartialEq + Send + Sync,
{
    fn value(&self) -> Value {
        self.uncommitted.clone().as_value()
    }
    fn committed_value(&self) -> Value {
        self.committed.clone().as_value()
    }
    fn set_value(&mut self, value: Value) -> Result<()> {
        self.set(T::try_from_value(value)?);
        Ok(())
    }
    fn is_changed(&self) -> bool {
        FieldCell::is_changed(self)
    }
    fn commit(&mut self) -> bool {
        FieldCell::commit(self)
    }
    fn rollback(&mut self) -> bool {
        FieldCell::rollback(self)
    }
    fn load(&mut self, value: Value) -> Result<()> {
        FieldCell::load(self, T::try_from_value(value)?);
        Ok(())
    }
}
