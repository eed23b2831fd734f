//! Static registry of the analytic queries.
//!
//! Seven streams per schema variant, built once at startup. Iteration order
//! is declaration order, which fixes the emission order per trigger.

use super::query::{
    AggregateExpr, FilterPredicate, OutputMode, QueryDefinition, SortSpec,
};
use crate::orderstream::schema::{Field, Schema, SchemaVariant};

/// Immutable table of registered query definitions.
pub struct QueryRegistry {
    queries: Vec<QueryDefinition>,
}

impl QueryRegistry {
    /// Build the seven analytic streams for a schema variant.
    pub fn for_variant(variant: SchemaVariant) -> Self {
        let queries = match variant {
            SchemaVariant::V1 => Self::v1_queries(),
            SchemaVariant::V2 => Self::v2_queries(),
        };
        Self { queries }
    }

    fn v1_queries() -> Vec<QueryDefinition> {
        vec![
            QueryDefinition {
                name: "raw_orders",
                group_by: vec![],
                aggregates: vec![],
                filter: None,
                projection: Some(Schema::for_variant(SchemaVariant::V1).field_names()),
                sort: None,
                output_mode: OutputMode::Append,
            },
            QueryDefinition {
                name: "total_sales",
                group_by: vec![],
                aggregates: vec![
                    AggregateExpr::sum(Field::Total, "total_sales"),
                    AggregateExpr::count("total_orders"),
                    AggregateExpr::avg(Field::Total, "avg_order_value"),
                ],
                filter: None,
                projection: None,
                sort: None,
                output_mode: OutputMode::Complete,
            },
            QueryDefinition {
                name: "sales_by_product",
                group_by: vec![Field::Product],
                aggregates: vec![
                    AggregateExpr::sum(Field::Total, "product_sales"),
                    AggregateExpr::sum(Field::Quantity, "total_quantity"),
                    AggregateExpr::count("order_count"),
                ],
                filter: None,
                projection: None,
                sort: Some(SortSpec::descending("product_sales")),
                output_mode: OutputMode::Complete,
            },
            QueryDefinition {
                name: "sales_by_client",
                group_by: vec![Field::ClientId, Field::ClientName],
                aggregates: vec![
                    AggregateExpr::sum(Field::Total, "total_spent"),
                    AggregateExpr::count("order_count"),
                    AggregateExpr::avg(Field::Total, "avg_order_value"),
                ],
                filter: None,
                projection: None,
                sort: Some(SortSpec::descending("total_spent")),
                output_mode: OutputMode::Complete,
            },
            QueryDefinition {
                name: "orders_by_status",
                group_by: vec![Field::Status],
                aggregates: vec![
                    AggregateExpr::count("order_count"),
                    AggregateExpr::sum(Field::Total, "total_value"),
                ],
                filter: None,
                projection: None,
                sort: None,
                output_mode: OutputMode::Complete,
            },
            QueryDefinition {
                name: "high_value_orders",
                group_by: vec![],
                aggregates: vec![],
                filter: Some(FilterPredicate::greater_than(Field::Total, 100.0)),
                projection: Some(vec![
                    Field::OrderId,
                    Field::ClientName,
                    Field::Product,
                    Field::Total,
                    Field::Status,
                ]),
                sort: None,
                output_mode: OutputMode::Append,
            },
            QueryDefinition {
                name: "top_products",
                group_by: vec![Field::Product],
                aggregates: vec![AggregateExpr::sum(Field::Quantity, "total_quantity_sold")],
                filter: None,
                projection: None,
                sort: Some(SortSpec::descending("total_quantity_sold")),
                output_mode: OutputMode::Complete,
            },
        ]
    }

    fn v2_queries() -> Vec<QueryDefinition> {
        vec![
            QueryDefinition {
                name: "raw_orders",
                group_by: vec![],
                aggregates: vec![],
                filter: None,
                projection: Some(Schema::for_variant(SchemaVariant::V2).field_names()),
                sort: None,
                output_mode: OutputMode::Append,
            },
            QueryDefinition {
                name: "total_sales",
                group_by: vec![],
                aggregates: vec![
                    AggregateExpr::sum(Field::TotalAmount, "total_sales"),
                    AggregateExpr::count("total_orders"),
                    AggregateExpr::avg(Field::TotalAmount, "avg_order_value"),
                ],
                filter: None,
                projection: None,
                sort: None,
                output_mode: OutputMode::Complete,
            },
            QueryDefinition {
                name: "sales_by_product",
                group_by: vec![Field::ProductId, Field::ProductName],
                aggregates: vec![
                    AggregateExpr::sum(Field::TotalAmount, "product_sales"),
                    AggregateExpr::sum(Field::Quantity, "total_quantity"),
                    AggregateExpr::count("order_count"),
                    AggregateExpr::avg(Field::UnitPrice, "avg_unit_price"),
                ],
                filter: None,
                projection: None,
                sort: Some(SortSpec::descending("product_sales")),
                output_mode: OutputMode::Complete,
            },
            QueryDefinition {
                name: "sales_by_client",
                group_by: vec![Field::ClientId],
                aggregates: vec![
                    AggregateExpr::sum(Field::TotalAmount, "total_spent"),
                    AggregateExpr::count("order_count"),
                    AggregateExpr::avg(Field::TotalAmount, "avg_order_value"),
                ],
                filter: None,
                projection: None,
                sort: Some(SortSpec::descending("total_spent")),
                output_mode: OutputMode::Complete,
            },
            QueryDefinition {
                name: "orders_by_status",
                group_by: vec![Field::Status],
                aggregates: vec![
                    AggregateExpr::count("order_count"),
                    AggregateExpr::sum(Field::TotalAmount, "total_value"),
                ],
                filter: None,
                projection: None,
                sort: None,
                output_mode: OutputMode::Complete,
            },
            QueryDefinition {
                name: "high_value_orders",
                group_by: vec![],
                aggregates: vec![],
                filter: Some(FilterPredicate::greater_than(Field::TotalAmount, 100.0)),
                projection: Some(vec![
                    Field::OrderId,
                    Field::ClientId,
                    Field::ProductName,
                    Field::TotalAmount,
                    Field::Status,
                ]),
                sort: None,
                output_mode: OutputMode::Append,
            },
            QueryDefinition {
                name: "top_products",
                group_by: vec![Field::ProductId, Field::ProductName],
                aggregates: vec![AggregateExpr::sum(Field::Quantity, "total_quantity_sold")],
                filter: None,
                projection: None,
                sort: Some(SortSpec::descending("total_quantity_sold")),
                output_mode: OutputMode::Complete,
            },
        ]
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryDefinition> {
        self.queries.iter()
    }

    /// Visit every definition in declaration order.
    pub fn for_each<F: FnMut(&QueryDefinition)>(&self, mut f: F) {
        for query in &self.queries {
            f(query);
        }
    }

    pub fn get(&self, name: &str) -> Option<&QueryDefinition> {
        self.queries.iter().find(|q| q.name == name)
    }
}
