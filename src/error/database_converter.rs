use crate::error::AppError;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Turns Diesel errors into structured [`AppError`] variants.
///
/// PostgreSQL reports the table, column and constraint of a violation in
/// separate fields, so no message parsing is needed.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// `operation` describes what was being attempted and ends up in the
    /// error chain of catch-all database failures.
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let entity = info.table_name().unwrap_or("resource").to_string();
        let field = info
            .column_name()
            .or_else(|| info.constraint_name())
            .unwrap_or("unknown")
            .to_string();

        match kind {
            DatabaseErrorKind::UniqueViolation => AppError::Duplicate {
                entity,
                field,
                value: info.details().unwrap_or_default().to_string(),
            },
            DatabaseErrorKind::NotNullViolation => AppError::Validation {
                field,
                reason: format!("Field is required for {}", entity),
            },
            DatabaseErrorKind::ForeignKeyViolation => AppError::Validation {
                field,
                reason: format!("Invalid reference from {}", entity),
            },
            DatabaseErrorKind::CheckViolation => AppError::Validation {
                field,
                reason: format!("Check constraint failed for {}", entity),
            },
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(format!("Database error: {}", info.message())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeInfo {
        message: &'static str,
        table: Option<&'static str>,
        column: Option<&'static str>,
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for FakeInfo {
        fn message(&self) -> &str {
            self.message
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            self.table
        }
        fn column_name(&self) -> Option<&str> {
            self.column
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(kind: DatabaseErrorKind, info: FakeInfo) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(info))
    }

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "load");
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_check_violation_uses_constraint_name() {
        let err = DatabaseErrorConverter::convert_diesel_error(
            db_error(
                DatabaseErrorKind::CheckViolation,
                FakeInfo {
                    message: "new row violates check constraint",
                    table: Some("proximity_alerts"),
                    column: None,
                    constraint: Some("proximity_alerts_radius_km_check"),
                },
            ),
            "insert alert",
        );
        match err {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "proximity_alerts_radius_km_check");
                assert!(reason.contains("proximity_alerts"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_foreign_key_violation_is_validation() {
        let err = DatabaseErrorConverter::convert_diesel_error(
            db_error(
                DatabaseErrorKind::ForeignKeyViolation,
                FakeInfo {
                    message: "insert or update violates foreign key constraint",
                    table: Some("notifications"),
                    column: None,
                    constraint: Some("notifications_user_id_fkey"),
                },
            ),
            "insert notification",
        );
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_unknown_kind_is_database_error() {
        let err = DatabaseErrorConverter::convert_diesel_error(
            db_error(
                DatabaseErrorKind::SerializationFailure,
                FakeInfo {
                    message: "could not serialize access",
                    table: None,
                    column: None,
                    constraint: None,
                },
            ),
            "update",
        );
        assert!(err.is_retryable());
    }
}
