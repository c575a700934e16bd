use crate::error::{DataverseError, Stage};

/// Optional OData clauses for
/// [`AdminClient::get_records`](crate::dataverse::adminclient::AdminClient::get_records).
///
/// The four clauses are independent: any subset may be supplied and they
/// compose freely. An empty options value produces no query string at all,
/// leaving retrieval bounded only by the platform's own page-size default.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Fields to project (`$select`).
    pub select: Vec<String>,
    /// OData filter expression (`$filter`).
    pub filter: Option<String>,
    /// Ordering expression, e.g. `createdon desc` (`$orderby`).
    pub order_by: Option<String>,
    /// Row limit (`$top`); must be positive.
    pub top: Option<u32>,
}

impl QueryOptions {
    /// Validate clause values at the boundary instead of trusting callers.
    pub(crate) fn validate(&self, stage: Stage) -> Result<(), DataverseError> {
        if self.top == Some(0) {
            return Err(DataverseError::Precondition {
                stage,
                message: "top must be a positive integer".to_string(),
            });
        }
        Ok(())
    }

    /// Render the clauses as a query string, `?`-prefixed, or an empty
    /// string when no clause is present. Filter and ordering values are
    /// percent-encoded so expression characters cannot corrupt the URL.
    pub(crate) fn to_query_string(&self) -> String {
        let mut clauses: Vec<String> = Vec::new();

        if !self.select.is_empty() {
            clauses.push(format!("$select={}", self.select.join(",")));
        }
        if let Some(filter) = &self.filter {
            clauses.push(format!("$filter={}", urlencoding::encode(filter)));
        }
        if let Some(order_by) = &self.order_by {
            clauses.push(format!("$orderby={}", urlencoding::encode(order_by)));
        }
        if let Some(top) = self.top {
            clauses.push(format!("$top={top}"));
        }

        if clauses.is_empty() {
            String::new()
        } else {
            format!("?{}", clauses.join("&"))
        }
    }
}
