//! User profiles with the embedded billing snapshot.

use serde::{Deserialize, Serialize};

use tiendita_core::{PaymentMode, UserId};

/// The billing address embedded in a profile.
///
/// Deliberately denormalized: distinct from the billing-kind rows in the
/// `address` table, which are materialized from this snapshot at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillingSnapshot {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl BillingSnapshot {
    /// Whether the snapshot is usable for checkout.
    ///
    /// The primary line is the only required field; checkout suspends and
    /// asks the caller for a billing address when it is blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.line1.trim().is_empty()
    }

    /// Shallow-merge a patch into this snapshot, replacing only the fields
    /// the patch provides.
    #[must_use]
    pub fn merged(&self, patch: &BillingPatch) -> Self {
        Self {
            line1: patch.line1.clone().unwrap_or_else(|| self.line1.clone()),
            line2: patch.line2.clone().or_else(|| self.line2.clone()),
            city: patch.city.clone().unwrap_or_else(|| self.city.clone()),
            state: patch.state.clone().unwrap_or_else(|| self.state.clone()),
            postal_code: patch
                .postal_code
                .clone()
                .unwrap_or_else(|| self.postal_code.clone()),
            country: patch
                .country
                .clone()
                .unwrap_or_else(|| self.country.clone()),
        }
    }
}

/// Partial update of the embedded billing snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingPatch {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// One-to-one user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub tax_id: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub phone_prefix: Option<String>,
    pub payment_mode: PaymentMode,
    pub billing_address: Option<BillingSnapshot>,
}

/// Merge-patch for a profile. `None` fields are left untouched; the billing
/// snapshot is itself shallow-merged rather than replaced wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub tax_id: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub phone_prefix: Option<String>,
    pub payment_mode: Option<PaymentMode>,
    pub billing_address: Option<BillingPatch>,
}

impl UserProfile {
    /// Apply a merge-patch, returning the updated profile.
    #[must_use]
    pub fn patched(&self, patch: &ProfilePatch) -> Self {
        let billing_address = match &patch.billing_address {
            Some(billing_patch) => Some(
                self.billing_address
                    .clone()
                    .unwrap_or_default()
                    .merged(billing_patch),
            ),
            None => self.billing_address.clone(),
        };

        Self {
            user_id: self.user_id,
            email: self.email.clone(),
            tax_id: patch.tax_id.clone().or_else(|| self.tax_id.clone()),
            company_name: patch
                .company_name
                .clone()
                .or_else(|| self.company_name.clone()),
            phone: patch.phone.clone().or_else(|| self.phone.clone()),
            phone_prefix: patch
                .phone_prefix
                .clone()
                .or_else(|| self.phone_prefix.clone()),
            payment_mode: patch.payment_mode.unwrap_or(self.payment_mode),
            billing_address,
        }
    }
}
