//! # Soft Delete
//!
//! Brands, categories and suppliers are never removed; they are marked
//! deleted and can be restored.
//!
//! ## Lifecycle
//! ```text
//!              soft_delete(now)
//!   ┌────────┐ ───────────────► ┌──────────────────────┐
//!   │ Active │                  │ Deleted { deleted_at }│
//!   └────────┘ ◄─────────────── └──────────────────────┘
//!                  restore()
//!
//!   soft_delete on Deleted → AlreadyDeleted
//!   restore on Active      → NotDeleted
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Whether a record is live or soft-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export)]
pub enum RecordStatus {
    #[default]
    Active,
    Deleted {
        #[ts(as = "String")]
        deleted_at: DateTime<Utc>,
    },
}

impl RecordStatus {
    /// Rebuilds the status from a nullable `deleted_at` column.
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(deleted_at) => RecordStatus::Deleted { deleted_at },
            None => RecordStatus::Active,
        }
    }

    /// The `deleted_at` column value.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordStatus::Active => None,
            RecordStatus::Deleted { deleted_at } => Some(*deleted_at),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }
}

/// Records with a soft-delete lifecycle.
pub trait SoftDelete {
    /// Entity name used in error messages ("Brand").
    const ENTITY: &'static str;

    fn id(&self) -> &str;
    fn status(&self) -> RecordStatus;
    fn set_status(&mut self, status: RecordStatus);

    fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Active → Deleted.
    fn soft_delete(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.is_active() {
            return Err(CoreError::AlreadyDeleted {
                entity: Self::ENTITY.to_string(),
                id: self.id().to_string(),
            });
        }
        self.set_status(RecordStatus::Deleted { deleted_at: now });
        Ok(())
    }

    /// Deleted → Active.
    fn restore(&mut self) -> CoreResult<()> {
        if self.is_active() {
            return Err(CoreError::NotDeleted {
                entity: Self::ENTITY.to_string(),
                id: self.id().to_string(),
            });
        }
        self.set_status(RecordStatus::Active);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thing {
        id: String,
        status: RecordStatus,
    }

    impl SoftDelete for Thing {
        const ENTITY: &'static str = "Thing";

        fn id(&self) -> &str {
            &self.id
        }
        fn status(&self) -> RecordStatus {
            self.status
        }
        fn set_status(&mut self, status: RecordStatus) {
            self.status = status;
        }
    }

    fn thing() -> Thing {
        Thing {
            id: "t1".into(),
            status: RecordStatus::Active,
        }
    }

    #[test]
    fn test_delete_then_restore() {
        let now = Utc::now();
        let mut t = thing();
        t.soft_delete(now).unwrap();
        assert_eq!(t.status().deleted_at(), Some(now));
        assert!(!t.is_active());

        t.restore().unwrap();
        assert!(t.is_active());
        assert_eq!(t.status().deleted_at(), None);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut t = thing();
        assert!(matches!(t.restore(), Err(CoreError::NotDeleted { .. })));

        t.soft_delete(Utc::now()).unwrap();
        let err = t.soft_delete(Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Thing t1 is already deleted");
    }

    #[test]
    fn test_column_mapping() {
        let now = Utc::now();
        assert_eq!(RecordStatus::from_deleted_at(None), RecordStatus::Active);
        assert_eq!(
            RecordStatus::from_deleted_at(Some(now)),
            RecordStatus::Deleted { deleted_at: now }
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(RecordStatus::Active).unwrap();
        assert_eq!(json["state"], "active");
    }
}
