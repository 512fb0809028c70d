use crate::error::InvoiceError;
use crate::models::{CustomerDetails, InvoiceTotals, LedgerRow, LineItem, NumericField};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Body of `POST /save_invoice`.
///
/// Every field is optional at the serde level so that a missing field is
/// reported by validation together with all other problems, instead of
/// failing deserialization on the first one.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveInvoiceRequest {
    #[serde(rename = "customerDetails")]
    #[validate(required(message = "customerDetails is required"), nested)]
    pub customer_details: Option<CustomerDetailsDto>,

    #[validate(required(message = "items is required"), nested)]
    pub items: Option<Vec<LineItemDto>>,
}

/// Serialize is needed by `required`, which records the rejected value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CustomerDetailsDto {
    #[validate(
        required(message = "inv_num is required"),
        custom(function = "validate_inv_num")
    )]
    pub inv_num: Option<String>,
    #[validate(required(message = "inv_date is required"))]
    pub inv_date: Option<String>,
    #[validate(required(message = "order_num is required"))]
    pub order_num: Option<String>,
    #[validate(required(message = "order_date is required"))]
    pub order_date: Option<String>,
    #[validate(required(message = "bill_type is required"))]
    pub bill_type: Option<String>,
    #[validate(required(message = "cust_name is required"))]
    pub cust_name: Option<String>,
    #[validate(required(message = "cust_addr is required"))]
    pub cust_addr: Option<String>,
    #[validate(required(message = "cust_phone is required"))]
    pub cust_phone: Option<String>,
    #[validate(required(message = "cust_gstin is required"))]
    pub cust_gstin: Option<String>,
    #[validate(required(message = "cust_state is required"))]
    pub cust_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LineItemDto {
    #[validate(required(message = "desc is required"))]
    pub desc: Option<String>,
    #[validate(required(message = "hsn is required"))]
    pub hsn: Option<String>,
    #[validate(required(message = "qty is required"))]
    pub qty: Option<NumericField>,
    #[validate(required(message = "rate is required"))]
    pub rate: Option<NumericField>,
    #[validate(required(message = "gst is required"))]
    pub gst: Option<NumericField>,
    #[validate(required(message = "total is required"))]
    pub total: Option<NumericField>,
}

/// The invoice number names the output file, so it must stay a single plain
/// file name component.
fn validate_inv_num(inv_num: &str) -> Result<(), ValidationError> {
    let problem = if inv_num.trim().is_empty() {
        Some("inv_num must not be empty")
    } else if inv_num.contains(['/', '\\']) {
        Some("inv_num must not contain path separators")
    } else if inv_num.contains("..") {
        Some("inv_num must not contain '..'")
    } else if inv_num.chars().any(char::is_control) {
        Some("inv_num must not contain control characters")
    } else {
        None
    };

    match problem {
        Some(message) => {
            let mut err = ValidationError::new("file_name");
            err.message = Some(message.into());
            Err(err)
        }
        None => Ok(()),
    }
}

impl SaveInvoiceRequest {
    /// Validate and split into the domain header details and items.
    pub fn into_parts(self) -> Result<(CustomerDetails, Vec<LineItem>), InvoiceError> {
        self.validate()?;

        let details = self.customer_details.unwrap_or_default();
        let details = CustomerDetails {
            inv_num: details.inv_num.unwrap_or_default(),
            inv_date: details.inv_date.unwrap_or_default(),
            order_num: details.order_num.unwrap_or_default(),
            order_date: details.order_date.unwrap_or_default(),
            bill_type: details.bill_type.unwrap_or_default(),
            cust_name: details.cust_name.unwrap_or_default(),
            cust_addr: details.cust_addr.unwrap_or_default(),
            cust_phone: details.cust_phone.unwrap_or_default(),
            cust_gstin: details.cust_gstin.unwrap_or_default(),
            cust_state: details.cust_state.unwrap_or_default(),
        };

        let items = self
            .items
            .unwrap_or_default()
            .into_iter()
            .map(LineItem::from)
            .collect();

        Ok((details, items))
    }
}

// Only reached after validation, where every field is present.
impl From<LineItemDto> for LineItem {
    fn from(dto: LineItemDto) -> Self {
        let missing = || NumericField::from("");
        Self {
            desc: dto.desc.unwrap_or_default(),
            hsn: dto.hsn.unwrap_or_default(),
            qty: dto.qty.unwrap_or_else(missing),
            rate: dto.rate.unwrap_or_else(missing),
            gst: dto.gst.unwrap_or_else(missing),
            total: dto.total.unwrap_or_else(missing),
        }
    }
}

/// One ledger row as returned by `GET /invoices`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerEntryResponse {
    #[serde(flatten)]
    pub details: CustomerDetails,
    /// Decoded items, or `None` when the stored string no longer decodes.
    pub items: Option<Vec<LineItem>>,
    /// The items field exactly as stored in the ledger.
    pub items_raw: String,
    #[serde(flatten)]
    pub totals: InvoiceTotals,
}

impl From<LedgerRow> for LedgerEntryResponse {
    fn from(row: LedgerRow) -> Self {
        let items = row.decoded_items().ok();
        Self {
            details: row.details,
            items,
            items_raw: row.items,
            totals: row.totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> SaveInvoiceRequest {
        serde_json::from_value(body).unwrap()
    }

    fn details() -> serde_json::Value {
        json!({
            "inv_num": "1001",
            "inv_date": "2024-04-01",
            "order_num": "PO-7",
            "order_date": "2024-03-28",
            "bill_type": "Credit",
            "cust_name": "Acme Traders",
            "cust_addr": "12 MG Road",
            "cust_phone": "9800000000",
            "cust_gstin": "29ABCDE1234F1Z5",
            "cust_state": "Karnataka"
        })
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let req = request(json!({
            "customerDetails": details(),
            "items": [
                {"desc": "Widget", "hsn": "1234", "qty": 2, "rate": 100, "gst": 18, "total": 236},
                {"desc": "Bolt", "hsn": "7318", "qty": "10", "rate": "1.50", "gst": "12", "total": "16.80"}
            ]
        }));

        let (details, items) = req.into_parts().unwrap();

        assert_eq!(details.inv_num, "1001");
        assert_eq!(details.cust_state, "Karnataka");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].qty, NumericField::integer(2));
        assert_eq!(items[1].rate, NumericField::from("1.50"));
    }

    #[test]
    fn empty_strings_are_accepted() {
        let mut body = details();
        body["cust_gstin"] = json!("");
        body["order_num"] = json!("");

        let (details, items) = request(json!({"customerDetails": body, "items": []}))
            .into_parts()
            .unwrap();

        assert_eq!(details.cust_gstin, "");
        assert!(items.is_empty());
    }

    #[test]
    fn reports_every_missing_field() {
        let mut body = details();
        body.as_object_mut().unwrap().remove("cust_name");
        body.as_object_mut().unwrap().remove("inv_date");
        let req = request(json!({
            "customerDetails": body,
            "items": [{"desc": "Widget", "qty": 1, "rate": 1, "gst": 0}]
        }));

        let message = match req.into_parts() {
            Err(InvoiceError::Validation(errors)) => errors.to_string(),
            other => panic!("expected validation error, got {:?}", other),
        };

        for field in ["cust_name", "inv_date", "hsn", "total"] {
            assert!(message.contains(field), "{field} missing from: {message}");
        }
    }

    #[test]
    fn missing_sections_are_validation_errors() {
        let err = request(json!({})).into_parts().unwrap_err();

        let InvoiceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields = errors.errors();
        assert!(fields.contains_key("customer_details"));
        assert!(fields.contains_key("items"));
    }

    #[test]
    fn missing_nested_sections_report_a_null_value() {
        let err = request(json!({"items": [{"desc": "Widget"}]}))
            .into_parts()
            .unwrap_err();

        let InvoiceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields = errors.field_errors();
        let missing = &fields["customer_details"][0];
        assert_eq!(missing.code, "required");
        assert_eq!(missing.params["value"], serde_json::Value::Null);
        assert!(errors.to_string().contains("hsn"));
    }

    #[test]
    fn rejects_invoice_numbers_unsafe_as_file_names() {
        for bad in ["", "  ", "../etc", "a/b", "a\\b", "x..y", "10\n01"] {
            let mut body = details();
            body["inv_num"] = json!(bad);
            let result = request(json!({"customerDetails": body, "items": []})).into_parts();
            assert!(
                matches!(result, Err(InvoiceError::Validation(_))),
                "{bad:?} was accepted"
            );
        }
    }

    #[test]
    fn non_numeric_values_pass_validation() {
        let req = request(json!({
            "customerDetails": details(),
            "items": [{"desc": "Widget", "hsn": "1234", "qty": "two", "rate": 100, "gst": 18, "total": 236}]
        }));

        let (_, items) = req.into_parts().unwrap();

        assert!(matches!(
            items[0].qty.to_decimal("qty"),
            Err(InvoiceError::Parse { field: "qty", .. })
        ));
    }

    #[test]
    fn ledger_entry_keeps_raw_items_when_they_do_not_decode() {
        let row = LedgerRow {
            details: CustomerDetails::default(),
            items: "Widget, large,1234,1,1,1,1".to_string(),
            totals: InvoiceTotals::default(),
        };

        let entry = LedgerEntryResponse::from(row);

        assert!(entry.items.is_none());
        assert_eq!(entry.items_raw, "Widget, large,1234,1,1,1,1");
    }
}
