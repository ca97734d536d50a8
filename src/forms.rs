//! Typed mutation payloads, one variant per form.
//!
//! Every form knows which resource it belongs to, how to validate itself
//! before a request is made, and how to encode itself as a JSON body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::Resource;
use crate::error::{StoreError, StoreResult};

/// Whether a form is being submitted to create or to update a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
  Create,
  Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
  /// HEMP/CBD
  Cbd,
  /// Recreational cannabis
  Recreational,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryForm {
  #[serde(default)]
  pub category_name: String,
  #[serde(default)]
  pub short_description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub industry: Option<Industry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryForm {
  #[serde(default)]
  pub sub_category_name: String,
  #[serde(default)]
  pub short_description: String,
  #[serde(rename = "categoryID", default)]
  pub category_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub industry: Option<Industry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipForm {
  #[serde(default)]
  pub plan_type: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub number_of_auction: i64,
  #[serde(default)]
  pub number_of_bids: i64,
  #[serde(default)]
  pub number_of_listing: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredListingForm {
  #[serde(default)]
  pub plan_title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub number_of_listing: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsletterForm {
  #[serde(default)]
  pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponseForm {
  #[serde(default)]
  pub admin_response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
  Pending,
  Approved,
  Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipStatusForm {
  pub status: MembershipStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordForm {
  Category(CategoryForm),
  Subcategory(SubcategoryForm),
  Membership(MembershipForm),
  SponsoredListing(SponsoredListingForm),
  Newsletter(NewsletterForm),
  ContactResponse(ContactResponseForm),
  MembershipStatus(MembershipStatusForm),
}

fn require(value: &str, message: &str) -> StoreResult<()> {
  if value.trim().is_empty() {
    return Err(StoreError::validation(message));
  }
  Ok(())
}

fn require_non_negative(value: i64, what: &str) -> StoreResult<()> {
  if value < 0 {
    return Err(StoreError::validation(format!(
      "Number of {} cannot be negative",
      what
    )));
  }
  Ok(())
}

#[allow(clippy::neg_cmp_op_on_partial_ord)]
fn require_positive_price(price: f64) -> StoreResult<()> {
  // Written this way round so that NaN fails too
  if !(price > 0.0) {
    return Err(StoreError::validation("Price must be greater than 0"));
  }
  Ok(())
}

/// Loose address check: one `@`, something on both sides, a dot in the
/// domain and no whitespace.
fn is_valid_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.contains('@')
        && domain
          .split_once('.')
          .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
    }
    None => false,
  }
}

impl RecordForm {
  /// Resource this form writes to.
  pub fn resource(&self) -> Resource {
    match self {
      RecordForm::Category(_) => Resource::Categories,
      RecordForm::Subcategory(_) => Resource::Subcategories,
      RecordForm::Membership(_) => Resource::Memberships,
      RecordForm::SponsoredListing(_) => Resource::SponsoredListings,
      RecordForm::Newsletter(_) => Resource::Newsletter,
      RecordForm::ContactResponse(_) => Resource::Contacts,
      RecordForm::MembershipStatus(_) => Resource::MembershipRequests,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      RecordForm::Category(_) => "category",
      RecordForm::Subcategory(_) => "subcategory",
      RecordForm::Membership(_) => "membership",
      RecordForm::SponsoredListing(_) => "sponsored listing",
      RecordForm::Newsletter(_) => "newsletter",
      RecordForm::ContactResponse(_) => "contact response",
      RecordForm::MembershipStatus(_) => "membership status",
    }
  }

  /// Local checks, run before any request is made. The first failing rule wins.
  pub fn validate(&self, mode: FormMode) -> StoreResult<()> {
    match self {
      RecordForm::Category(form) => {
        require(&form.category_name, "Category name is required")?;
        if mode == FormMode::Create && form.industry.is_none() {
          return Err(StoreError::validation("Industry is required"));
        }
      }
      RecordForm::Subcategory(form) => {
        require(&form.category_id, "Please select a category")?;
        require(&form.sub_category_name, "Subcategory name is required")?;
      }
      RecordForm::Membership(form) => {
        require(&form.plan_type, "Plan type is required")?;
        require(&form.description, "Description is required")?;
        require_positive_price(form.price)?;
        require_non_negative(form.number_of_auction, "auctions")?;
        require_non_negative(form.number_of_bids, "bids")?;
        require_non_negative(form.number_of_listing, "listings")?;
      }
      RecordForm::SponsoredListing(form) => {
        require(&form.plan_title, "Plan title is required")?;
        require(&form.description, "Description is required")?;
        require_positive_price(form.price)?;
        if form.number_of_listing <= 0 {
          return Err(StoreError::validation(
            "Number of listings must be greater than 0",
          ));
        }
      }
      RecordForm::Newsletter(form) => {
        if !is_valid_email(form.email.trim()) {
          return Err(StoreError::validation(
            "Invalid email Address. Please enter a valid email.",
          ));
        }
      }
      RecordForm::ContactResponse(form) => {
        require(&form.admin_response, "Admin response is required")?;
      }
      RecordForm::MembershipStatus(_) => {}
    }
    Ok(())
  }

  /// JSON body sent to the backend.
  pub fn to_body(&self) -> Value {
    let body = match self {
      RecordForm::Category(form) => serde_json::to_value(form),
      RecordForm::Subcategory(form) => serde_json::to_value(form),
      RecordForm::Membership(form) => serde_json::to_value(form),
      RecordForm::SponsoredListing(form) => serde_json::to_value(form),
      RecordForm::Newsletter(form) => serde_json::to_value(form),
      RecordForm::ContactResponse(form) => serde_json::to_value(form),
      RecordForm::MembershipStatus(form) => serde_json::to_value(form),
    };
    // Plain structs of strings and numbers always serialize
    body.unwrap_or(Value::Null)
  }

  /// Parse a JSON object into the form for `resource`.
  pub fn from_json(resource: Resource, value: Value) -> StoreResult<Self> {
    let invalid = |e: serde_json::Error| {
      StoreError::validation(format!("Invalid {} form: {}", resource, e))
    };

    let form = match resource {
      Resource::Categories => RecordForm::Category(serde_json::from_value(value).map_err(invalid)?),
      Resource::Subcategories => {
        RecordForm::Subcategory(serde_json::from_value(value).map_err(invalid)?)
      }
      Resource::Memberships => {
        RecordForm::Membership(serde_json::from_value(value).map_err(invalid)?)
      }
      Resource::SponsoredListings => {
        RecordForm::SponsoredListing(serde_json::from_value(value).map_err(invalid)?)
      }
      Resource::Newsletter => RecordForm::Newsletter(serde_json::from_value(value).map_err(invalid)?),
      Resource::Contacts => {
        RecordForm::ContactResponse(serde_json::from_value(value).map_err(invalid)?)
      }
      Resource::MembershipRequests => {
        RecordForm::MembershipStatus(serde_json::from_value(value).map_err(invalid)?)
      }
      Resource::NewsletterData => {
        return Err(StoreError::validation(format!(
          "{} records cannot be edited",
          resource
        )))
      }
    };
    Ok(form)
  }
}
