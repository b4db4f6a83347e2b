use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{
    Confirmation, CoverageGroup, NewOrder, OrderAggregate, OrderEdit, OrderPage, OrderType,
    ProductFamily, Unit,
};
use crate::scheduler::ScanReport;

// ============================================================================
// Wire Types
// ============================================================================
//
// Requests take camelCase English names; the historical French names of the
// order form are accepted as aliases.
//
// ============================================================================

/// Response envelope shared by every route.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default, alias = "technologie")]
    pub technology: String,
    #[serde(default, alias = "familleProduit")]
    pub product_family: ProductFamily,
    #[serde(default, alias = "groupeCouverture")]
    pub coverage_group: CoverageGroup,
    #[serde(default, alias = "typCommande")]
    pub order_type: OrderType,
    #[serde(default, alias = "clientLivreId")]
    pub client_id: Option<String>,
    #[serde(default, alias = "clientFinal")]
    pub client_name: String,
    #[serde(alias = "quantiteCommandee")]
    pub ordered_quantity: Option<Decimal>,
    #[serde(default, alias = "unite")]
    pub unit: Unit,
    #[serde(alias = "dateLivraison")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default, alias = "quantiteExpediee")]
    pub shipped_quantity: Decimal,
    #[serde(default, alias = "quantiteEnPreparation")]
    pub in_preparation_quantity: Decimal,
    #[serde(default, alias = "commandeConfirmee")]
    pub confirm_in_full: bool,
}

impl CreateOrderRequest {
    /// Split out the two fields serde cannot default; the caller reports
    /// whichever is missing.
    pub fn into_new_order(self) -> Result<NewOrder, &'static str> {
        let ordered_quantity = self.ordered_quantity.ok_or("ordered_quantity")?;
        let delivery_date = self.delivery_date.ok_or("delivery_date")?;

        Ok(NewOrder {
            technology: self.technology,
            product_family: self.product_family,
            coverage_group: self.coverage_group,
            order_type: self.order_type,
            client_id: self.client_id,
            client_name: self.client_name,
            ordered_quantity,
            unit: self.unit,
            delivery_date,
            creation_date: None,
            shipped_quantity: self.shipped_quantity,
            in_preparation_quantity: self.in_preparation_quantity,
            confirm_in_full: self.confirm_in_full,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[serde(alias = "technologie")]
    pub technology: Option<String>,
    #[serde(alias = "familleProduit")]
    pub product_family: Option<ProductFamily>,
    #[serde(alias = "groupeCouverture")]
    pub coverage_group: Option<CoverageGroup>,
    #[serde(alias = "typCommande")]
    pub order_type: Option<OrderType>,
    #[serde(alias = "clientLivreId")]
    pub client_id: Option<String>,
    #[serde(alias = "clientFinal")]
    pub client_name: Option<String>,
    #[serde(alias = "unite")]
    pub unit: Option<Unit>,
    #[serde(alias = "dateLivraison")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(alias = "quantiteExpediee")]
    pub shipped_quantity: Option<Decimal>,
    #[serde(alias = "quantiteEnPreparation")]
    pub in_preparation_quantity: Option<Decimal>,
}

impl From<UpdateOrderRequest> for OrderEdit {
    fn from(req: UpdateOrderRequest) -> Self {
        OrderEdit {
            technology: req.technology,
            product_family: req.product_family,
            coverage_group: req.coverage_group,
            order_type: req.order_type,
            client_id: req.client_id,
            client_name: req.client_name,
            unit: req.unit,
            delivery_date: req.delivery_date,
            shipped_quantity: req.shipped_quantity,
            in_preparation_quantity: req.in_preparation_quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    #[serde(alias = "quantiteConfirmee")]
    pub quantity: Option<Decimal>,
    #[serde(alias = "dateConfirmation")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    /// confirmed | unconfirmed | all
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KpiParams {
    pub period: Option<crate::reporting::ReportingPeriod>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub top: Option<usize>,
}

/// An order with its ledger figures worked out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub version: i64,
    pub technology: String,
    pub product_family: ProductFamily,
    pub coverage_group: CoverageGroup,
    pub order_type: OrderType,
    pub client_id: String,
    pub client_name: String,
    pub ordered_quantity: Decimal,
    pub unit: Unit,
    pub delivery_date: NaiveDate,
    pub creation_date: NaiveDate,
    pub confirmations: Vec<Confirmation>,
    pub total_confirmed: Decimal,
    pub remaining_to_deliver: Decimal,
    pub fully_confirmed: bool,
    pub latest_confirmation_date: Option<NaiveDate>,
    pub shipped_quantity: Decimal,
    pub in_preparation_quantity: Decimal,
}

impl From<&OrderAggregate> for OrderView {
    fn from(order: &OrderAggregate) -> Self {
        Self {
            id: order.id,
            version: order.version,
            technology: order.details.technology.clone(),
            product_family: order.details.product_family,
            coverage_group: order.details.coverage_group,
            order_type: order.details.order_type,
            client_id: order.details.client_id.clone(),
            client_name: order.details.client_name.clone(),
            ordered_quantity: order.ordered_quantity(),
            unit: order.unit,
            delivery_date: order.delivery_date,
            creation_date: order.creation_date,
            confirmations: order.confirmations().to_vec(),
            total_confirmed: order.total_confirmed(),
            remaining_to_deliver: order.remaining_to_deliver(),
            fully_confirmed: order.is_fully_confirmed(),
            latest_confirmation_date: order.latest_confirmation_date(),
            shipped_quantity: order.shipped_quantity,
            in_preparation_quantity: order.in_preparation_quantity,
        }
    }
}

impl From<OrderPage> for Envelope<Vec<OrderView>> {
    fn from(page: OrderPage) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(page.orders.iter().map(OrderView::from).collect()),
            pagination: Some(Pagination {
                page: page.page,
                limit: page.limit,
                total: page.total,
                pages: page.pages,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanView {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub scanned: usize,
    pub at_risk: Vec<Uuid>,
}

impl From<ScanReport> for ScanView {
    fn from(report: ScanReport) -> Self {
        Self {
            window_start: report.window_start,
            window_end: report.window_end,
            scanned: report.scanned,
            at_risk: report.at_risk,
        }
    }
}
