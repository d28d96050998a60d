use query_builder::{NativeQuery, Select};
use tables_api::QueryPayload;

use crate::error::TablesError;

/// Anything that can be packaged as a `{sql, bindings}` request body.
pub trait TableQuery {
    fn to_payload(&self) -> Result<QueryPayload, TablesError>;
}

impl TableQuery for QueryPayload {
    fn to_payload(&self) -> Result<QueryPayload, TablesError> {
        Ok(self.clone())
    }
}

impl TableQuery for NativeQuery {
    fn to_payload(&self) -> Result<QueryPayload, TablesError> {
        Ok(QueryPayload::new(self.sql.clone(), self.bindings.clone()))
    }
}

impl TableQuery for Select {
    fn to_payload(&self) -> Result<QueryPayload, TablesError> {
        self.build()?.to_payload()
    }
}

impl<Q: TableQuery + ?Sized> TableQuery for &Q {
    fn to_payload(&self) -> Result<QueryPayload, TablesError> {
        (**self).to_payload()
    }
}
