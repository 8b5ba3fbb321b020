//! Built-in demo catalog: carts become priced orders, orders become invoices.

use autoproc_adapter_inprocess::InProcessEngine;
use autoproc_app::registry::ProcessRegistry;
use autoproc_domain::error::AutoProcError;
use autoproc_domain::param::{ParamValue, Params};
use autoproc_domain::procedure::{ProcedureDescriptor, ProcedureRole};
use autoproc_domain::process::ProcessType;
use autoproc_domain::restriction::Restriction;
use serde_json::{Value, json};

const DEFAULT_TAX_RATE: f64 = 0.2;

/// Register the demo procedures on `engine` and return the matching registry.
///
/// # Errors
///
/// Returns an error if a registration is invalid.
pub fn register(engine: &InProcessEngine) -> Result<ProcessRegistry, AutoProcError> {
    engine.register_procedure("order.validate", validate_order);
    engine.register_procedure("order.price", price_order);
    engine.register_procedure("order.notify", |message, _| {
        tracing::info!(order = %message, "warehouse notified");
        Ok(Value::Null)
    });
    engine.register_procedure("invoice.draft", draft_invoice);

    ProcessRegistry::builder()
        .register_process_type(
            ProcessType::builder()
                .name("Order")
                .description("Price a shopping cart")
                .msg_kind("Cart")
                .result_kind("Order")
                .build()?,
        )
        .register_process_type(
            ProcessType::builder()
                .name("Invoice")
                .description("Draft the invoice of a priced order")
                .msg_kind("Order")
                .result_kind("Invoice")
                .restriction(Restriction::new(["cancelled"])?)
                .build()?,
        )
        .register_procedure(
            ProcedureDescriptor::new("ValidateOrder", "Order", "order.validate")
                .with_description("Reject empty carts")
                .with_role(ProcedureRole::Default),
        )
        .register_procedure(
            ProcedureDescriptor::new("PriceOrder", "Order", "order.price")
                .with_description("Sum the cart lines")
                .with_role(ProcedureRole::Result),
        )
        .register_procedure(
            ProcedureDescriptor::new("NotifyWarehouse", "Order", "order.notify")
                .with_description("Log the order for the warehouse"),
        )
        .register_procedure(
            ProcedureDescriptor::new("DraftInvoice", "Invoice", "invoice.draft")
                .with_description("Add tax to the order total, `tax_rate` param")
                .with_role(ProcedureRole::Result),
        )
        .build()
}

fn lines(cart: &Value) -> &[Value] {
    cart.get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn validate_order(cart: &Value, _: &Params) -> Result<Value, String> {
    if lines(cart).is_empty() {
        return Err("cart has no items".to_string());
    }
    Ok(Value::Null)
}

fn price_order(cart: &Value, _: &Params) -> Result<Value, String> {
    let mut total = 0.0;
    for line in lines(cart) {
        let price = line
            .get("price")
            .and_then(Value::as_f64)
            .ok_or_else(|| format!("line without price: {line}"))?;
        let quantity = line.get("quantity").and_then(Value::as_f64).unwrap_or(1.0);
        total += price * quantity;
    }
    Ok(json!({
        "state_ctx": "priced",
        "lines": lines(cart).len(),
        "total": total,
    }))
}

fn draft_invoice(order: &Value, params: &Params) -> Result<Value, String> {
    let total = order
        .get("total")
        .and_then(Value::as_f64)
        .ok_or_else(|| "order has no total".to_string())?;
    let rate = match params.get("tax_rate") {
        None => DEFAULT_TAX_RATE,
        Some(ParamValue::Number(rate)) => *rate,
        #[allow(clippy::cast_precision_loss)]
        Some(ParamValue::Integer(rate)) => *rate as f64,
        Some(other) => return Err(format!("tax_rate is not a number: {other}")),
    };
    Ok(json!({
        "state_ctx": "drafted",
        "net": total,
        "tax": total * rate,
        "gross": total * (1.0 + rate),
    }))
}
