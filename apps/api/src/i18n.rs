//! # Localized Error Messages
//!
//! Error bodies are rendered in the caller's language.
//!
//! ```text
//! Accept-Language: es-CO,es;q=0.9,en;q=0.8
//!        │
//!        ▼
//! first supported primary tag ("es") ──► Locale::Es
//! nothing supported              ──────► KARDEX_DEFAULT_LOCALE
//! ```

use kardex_core::{InvoiceAction, InvoiceStatus, Money, Role};

/// Supported message languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// Parses a language tag (`es`, `es-CO`, `EN`).
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "es" => Some(Locale::Es),
            _ => None,
        }
    }

    /// Picks the preferred supported locale from an `Accept-Language` value.
    ///
    /// Entries are taken in descending `q` order; ties keep header order.
    pub fn negotiate(header: Option<&str>, default: Locale) -> Locale {
        let Some(header) = header else {
            return default;
        };

        let mut candidates: Vec<(f32, Locale)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(';');
                let locale = Locale::parse(parts.next()?)?;
                let quality = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                (quality > 0.0).then_some((quality, locale))
            })
            .collect();

        // stable sort keeps header order among equal weights
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.first().map(|(_, locale)| *locale).unwrap_or(default)
    }
}

/// Entities named in not-found messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Invoice,
    Product,
    Customer,
    Payment,
    Tenant,
}

impl Entity {
    fn name(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Entity::Invoice, Locale::En) => "Invoice",
            (Entity::Invoice, Locale::Es) => "la factura",
            (Entity::Product, Locale::En) => "Product",
            (Entity::Product, Locale::Es) => "el producto",
            (Entity::Customer, Locale::En) => "Customer",
            (Entity::Customer, Locale::Es) => "el cliente",
            (Entity::Payment, Locale::En) => "Payment",
            (Entity::Payment, Locale::Es) => "el pago",
            (Entity::Tenant, Locale::En) => "Tenant",
            (Entity::Tenant, Locale::Es) => "la empresa",
        }
    }
}

/// A user-facing message with its parameters, renderable in any locale.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    NotFound { entity: Entity, id: String },
    InsufficientStock { product: String, available: i64, requested: i64 },
    InvalidTransition { invoice_id: String, from: InvoiceStatus, action: InvoiceAction },
    QuotaExceeded { limit: i64, used: i64 },
    PaymentExceedsBalance { amount: Money, balance: Money },
    InvoiceClosed { invoice_id: String, status: InvoiceStatus },
    InvoiceHasPayments { invoice_id: String, count: i64 },
    Forbidden { role: Role, operation: String },
    /// English validation detail, naming the field.
    Validation(String),
    MalformedRequest(String),
    MissingIdentity(String),
    Conflict,
    Internal,
}

impl Message {
    pub fn render(&self, locale: Locale) -> String {
        match locale {
            Locale::En => self.english(),
            Locale::Es => self.spanish(),
        }
    }

    fn english(&self) -> String {
        match self {
            Message::NotFound { entity, id } => {
                format!("{} not found: {}", entity.name(Locale::En), id)
            }
            Message::InsufficientStock { product, available, requested } => {
                format!(
                    "Insufficient stock for {product}: available {available}, requested {requested}"
                )
            }
            Message::InvalidTransition { invoice_id, from, action } => {
                format!("Invoice {invoice_id} is {from}, cannot {action}")
            }
            Message::QuotaExceeded { limit, used } => {
                format!("Monthly invoice quota exceeded: {used} of {limit} used")
            }
            Message::PaymentExceedsBalance { amount, balance } => {
                format!("Payment of {amount} exceeds the outstanding balance of {balance}")
            }
            Message::InvoiceClosed { invoice_id, status } => {
                format!("Invoice {invoice_id} is {status}, payments are not accepted")
            }
            Message::InvoiceHasPayments { invoice_id, count } => {
                format!(
                    "Invoice {invoice_id} has {count} recorded payment(s) and cannot be deleted"
                )
            }
            Message::Forbidden { role, operation } => {
                format!("Role {role} is not allowed to {operation}")
            }
            Message::Validation(detail) => format!("Invalid input: {detail}"),
            Message::MalformedRequest(detail) => format!("Malformed request: {detail}"),
            Message::MissingIdentity(header) => format!("Missing or invalid {header} header"),
            Message::Conflict => "The resource was modified concurrently, please retry".to_string(),
            Message::Internal => "An internal error occurred".to_string(),
        }
    }

    fn spanish(&self) -> String {
        match self {
            Message::NotFound { entity, id } => {
                format!("No se encontró {} {}", entity.name(Locale::Es), id)
            }
            Message::InsufficientStock { product, available, requested } => {
                format!(
                    "Stock insuficiente para {product}: disponible {available}, \
                     solicitado {requested}"
                )
            }
            Message::InvalidTransition { invoice_id, from, action } => {
                format!(
                    "La factura {invoice_id} está en estado {from}, no se puede {}",
                    action_es(*action)
                )
            }
            Message::QuotaExceeded { limit, used } => {
                format!("Cuota mensual de facturas excedida: {used} de {limit} usadas")
            }
            Message::PaymentExceedsBalance { amount, balance } => {
                format!("El pago de {amount} excede el saldo pendiente de {balance}")
            }
            Message::InvoiceClosed { invoice_id, status } => {
                format!("La factura {invoice_id} está en estado {status}, no admite pagos")
            }
            Message::InvoiceHasPayments { invoice_id, count } => {
                format!(
                    "La factura {invoice_id} tiene {count} pago(s) registrado(s) \
                     y no se puede eliminar"
                )
            }
            Message::Forbidden { role, operation } => {
                format!("El rol {role} no tiene permiso para: {operation}")
            }
            Message::Validation(detail) => format!("Datos inválidos: {detail}"),
            Message::MalformedRequest(detail) => format!("Solicitud mal formada: {detail}"),
            Message::MissingIdentity(header) => {
                format!("Falta el encabezado {header} o no es válido")
            }
            Message::Conflict => {
                "El recurso fue modificado de forma concurrente, reintente".to_string()
            }
            Message::Internal => "Ocurrió un error interno".to_string(),
        }
    }
}

fn action_es(action: InvoiceAction) -> &'static str {
    match action {
        InvoiceAction::Update => "modificar",
        InvoiceAction::Send => "enviar",
        InvoiceAction::Cancel => "anular",
        InvoiceAction::Delete => "eliminar",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate() {
        assert_eq!(Locale::negotiate(None, Locale::En), Locale::En);
        assert_eq!(Locale::negotiate(Some("es-CO,es;q=0.9,en;q=0.8"), Locale::En), Locale::Es);
        assert_eq!(Locale::negotiate(Some("fr-FR, en;q=0.5, es;q=0.7"), Locale::En), Locale::Es);
        assert_eq!(Locale::negotiate(Some("de, fr"), Locale::Es), Locale::Es);
        assert_eq!(Locale::negotiate(Some("es;q=0"), Locale::En), Locale::En);
    }

    #[test]
    fn test_render_both_languages() {
        let msg = Message::NotFound {
            entity: Entity::Invoice,
            id: "inv-1".to_string(),
        };
        assert_eq!(msg.render(Locale::En), "Invoice not found: inv-1");
        assert_eq!(msg.render(Locale::Es), "No se encontró la factura inv-1");

        let msg = Message::InvalidTransition {
            invoice_id: "inv-1".to_string(),
            from: InvoiceStatus::Sent,
            action: InvoiceAction::Send,
        };
        assert_eq!(msg.render(Locale::En), "Invoice inv-1 is SENT, cannot send");
        assert_eq!(
            msg.render(Locale::Es),
            "La factura inv-1 está en estado SENT, no se puede enviar"
        );
    }
}
