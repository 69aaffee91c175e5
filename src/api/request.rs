//! Request types for the reconciliation API.
//!
//! A reconciliation request is a multipart upload with one file per input
//! slot. All five slots must be filled before anything is processed.

use std::collections::HashMap;
use std::fmt;

use axum::extract::Multipart;
use tracing::debug;

use crate::config::ReconConfig;
use crate::error::ReconResult;
use crate::io::read_table;
use crate::reconciliation::ReconInputs;

use super::response::ApiErrorResponse;

/// The five upload slots, named by their multipart field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadSlot {
    /// The HCM absence export.
    Hcm,
    /// The fractioned-absence export.
    FraccionadasPs,
    /// The total-absence export.
    TotalPs,
    /// The Segovia monetary export.
    DineroSegovia,
    /// The Marmato monetary export.
    DineroMarmato,
}

impl UploadSlot {
    /// Every slot, in form order.
    pub const ALL: [UploadSlot; 5] = [
        UploadSlot::Hcm,
        UploadSlot::FraccionadasPs,
        UploadSlot::TotalPs,
        UploadSlot::DineroSegovia,
        UploadSlot::DineroMarmato,
    ];

    /// The multipart field name.
    pub fn field_name(self) -> &'static str {
        match self {
            UploadSlot::Hcm => "hcm",
            UploadSlot::FraccionadasPs => "fraccionadas_ps",
            UploadSlot::TotalPs => "total_ps",
            UploadSlot::DineroSegovia => "dinero_segovia",
            UploadSlot::DineroMarmato => "dinero_marmato",
        }
    }

    /// Looks a slot up by field name.
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.field_name() == name)
    }
}

impl fmt::Display for UploadSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// The uploaded files, keyed by slot.
#[derive(Debug, Clone, Default)]
pub struct UploadBundle {
    files: HashMap<UploadSlot, Vec<u8>>,
}

impl UploadBundle {
    /// Collects the upload slots from a multipart body.
    ///
    /// Unknown fields are ignored. An empty file counts as a missing slot.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiErrorResponse> {
        let mut bundle = Self::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Err(ApiErrorResponse::invalid_upload(e.body_text())),
            };

            let name = field.name().unwrap_or("").to_string();
            let Some(slot) = UploadSlot::from_field_name(&name) else {
                debug!(field = %name, "Ignoring unknown upload field");
                continue;
            };

            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiErrorResponse::invalid_upload(format!("{}: {}", slot, e.body_text())))?;
            bundle.insert(slot, bytes.to_vec());
        }

        Ok(bundle)
    }

    /// Stores a file for a slot, replacing any earlier one.
    pub fn insert(&mut self, slot: UploadSlot, bytes: Vec<u8>) {
        if bytes.is_empty() {
            self.files.remove(&slot);
        } else {
            self.files.insert(slot, bytes);
        }
    }

    /// The slots still without a file, in form order.
    pub fn missing(&self) -> Vec<UploadSlot> {
        UploadSlot::ALL
            .into_iter()
            .filter(|slot| !self.files.contains_key(slot))
            .collect()
    }

    /// Fails with `MISSING_FILES` unless every slot is filled.
    pub fn ensure_complete(&self) -> Result<(), ApiErrorResponse> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiErrorResponse::missing_files(&missing))
        }
    }

    /// Reads every uploaded workbook with its source's header offset.
    ///
    /// Must only be called on a complete bundle; absent slots read as
    /// unreadable workbooks.
    pub fn into_inputs(self, config: &ReconConfig) -> ReconResult<ReconInputs> {
        let sources = &config.sources;
        let file = |slot: UploadSlot| self.files.get(&slot).map(Vec::as_slice).unwrap_or(&[]);

        Ok(ReconInputs {
            primary: read_table(file(UploadSlot::Hcm), "hcm", sources.primary.header_skip_rows)?,
            fractioned: read_table(
                file(UploadSlot::FraccionadasPs),
                "fraccionadas_ps",
                sources.fractioned.source.header_skip_rows,
            )?,
            total: read_table(
                file(UploadSlot::TotalPs),
                "total_ps",
                sources.total.header_skip_rows,
            )?,
            monetary: vec![
                read_table(
                    file(UploadSlot::DineroSegovia),
                    "dinero_segovia",
                    sources.monetary.header_skip_rows,
                )?,
                read_table(
                    file(UploadSlot::DineroMarmato),
                    "dinero_marmato",
                    sources.monetary.header_skip_rows,
                )?,
            ],
        })
    }
}
