// crates/core/src/dataset.rs
//! Per-dataset descriptors for the two monitored processes.
//!
//! The ROP and Setup-Time monitors share one aggregation engine; everything
//! that differs between them — fact table, metric columns, and the group-by
//! allow-list — lives in a [`DatasetSpec`]. Caller-supplied `groupBy`
//! strings are only ever matched against the allow-list and mapped to
//! column identifiers through these static tables, so no request string can
//! reach query text.

use thiserror::Error;

/// A categorical column callers may group by.
#[derive(Debug, PartialEq, Eq)]
pub struct Dimension {
    /// Token accepted in the `groupBy` query parameter.
    pub name: &'static str,
    /// Column identifier spliced into query text. Static by construction.
    pub column: &'static str,
}

/// Rejected `groupBy` value. Raised before any query exists to run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid groupBy field `{field}` for dataset `{dataset}`")]
pub struct InvalidDimension {
    pub dataset: &'static str,
    pub field: String,
}

/// Everything dataset-specific the aggregation engine needs.
#[derive(Debug)]
pub struct DatasetSpec {
    /// Short name used in logs and error messages.
    pub name: &'static str,
    /// Fact table holding the pre-computed prediction-error records.
    pub table: &'static str,
    /// Column holding the AI/ML-recommended absolute error.
    pub recommended_metric: &'static str,
    /// Column holding the planned/baseline absolute error.
    pub planned_metric: &'static str,
    /// Allow-listed group-by dimensions.
    pub dimensions: &'static [Dimension],
}

impl DatasetSpec {
    /// Resolve a `groupBy` token against the allow-list.
    ///
    /// Matching is exact and case-sensitive; anything else is an
    /// [`InvalidDimension`].
    pub fn dimension(&'static self, field: &str) -> Result<&'static Dimension, InvalidDimension> {
        self.dimensions
            .iter()
            .find(|d| d.name == field)
            .ok_or_else(|| InvalidDimension {
                dataset: self.name,
                field: field.to_string(),
            })
    }
}

/// Rate-of-operations monitor.
pub static ROP: DatasetSpec = DatasetSpec {
    name: "rop",
    table: "rop_monitor",
    recommended_metric: "recommended_rop_abs_error",
    planned_metric: "planned_rop_abs_error",
    dimensions: &[
        Dimension { name: "interface", column: "interface" },
        Dimension { name: "platform", column: "platform" },
        Dimension { name: "segment", column: "segment" },
        Dimension { name: "businessUnit", column: "business_unit" },
        Dimension { name: "facility", column: "facility" },
        Dimension { name: "machine", column: "machine" },
        Dimension { name: "packerResource", column: "packer_resource" },
    ],
};

/// Setup-time monitor. Adds the setup-matrix dimensions on top of the
/// shared categorical set.
pub static SETUP_TIME: DatasetSpec = DatasetSpec {
    name: "setup-time",
    table: "setup_time_monitor",
    recommended_metric: "recommended_st_abs_error",
    planned_metric: "planned_st_abs_error",
    dimensions: &[
        Dimension { name: "setupMatrix", column: "setup_matrix" },
        Dimension { name: "fromSetupGroup", column: "from_setup_group" },
        Dimension { name: "toSetupGroup", column: "to_setup_group" },
        Dimension { name: "interface", column: "interface" },
        Dimension { name: "platform", column: "platform" },
        Dimension { name: "segment", column: "segment" },
        Dimension { name: "businessUnit", column: "business_unit" },
        Dimension { name: "facility", column: "facility" },
        Dimension { name: "machine", column: "machine" },
        Dimension { name: "packerResource", column: "packer_resource" },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rop_dimension_lookup_maps_to_column() {
        let dim = ROP.dimension("businessUnit").unwrap();
        assert_eq!(dim.column, "business_unit");

        let dim = ROP.dimension("interface").unwrap();
        assert_eq!(dim.column, "interface");
    }

    #[test]
    fn unknown_dimension_is_rejected() {
        let err = ROP.dimension("orderNumber").unwrap_err();
        assert_eq!(err.dataset, "rop");
        assert_eq!(err.field, "orderNumber");
        assert!(err.to_string().contains("orderNumber"));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(ROP.dimension("INTERFACE").is_err());
        assert!(ROP.dimension("Interface").is_err());
    }

    #[test]
    fn sql_fragments_are_rejected() {
        assert!(ROP.dimension("interface; DROP TABLE rop_monitor").is_err());
        assert!(ROP.dimension("interface--").is_err());
    }

    #[test]
    fn setup_time_includes_matrix_dimensions() {
        assert!(SETUP_TIME.dimension("setupMatrix").is_ok());
        assert!(SETUP_TIME.dimension("fromSetupGroup").is_ok());
        assert!(SETUP_TIME.dimension("toSetupGroup").is_ok());
    }

    #[test]
    fn rop_excludes_matrix_dimensions() {
        assert!(ROP.dimension("setupMatrix").is_err());
    }
}
