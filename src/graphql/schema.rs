//! Customer query schema.

use async_graphql::{EmptyMutation, EmptySubscription, Object, Schema, SimpleObject};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, SimpleObject, Serialize, Deserialize)]
pub struct Customer {
    pub id: i32,
    pub name: String,
}

impl Customer {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All known customers, in id order.
    async fn customers(&self) -> Vec<Customer> {
        vec![Customer::new(1, "Andreas"), Customer::new(2, "Rossen")]
    }
}

pub type CustomerSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn build_schema() -> CustomerSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription).finish()
}
