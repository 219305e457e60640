// src/services/validation_service.rs

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use image::{DynamicImage, ImageOutputFormat, Luma};
use qrcode::{EcLevel, QrCode};
use uuid::Uuid;

use crate::{
    common::{error::AppError, normalize::normalize_optional},
    db::backend::{with_timeout, Backend},
    models::validation::{
        CertificateValidation, DocumentValidation, IssueCertificatePayload, IssueDocumentPayload,
        ValidationKind,
    },
};

pub const CODE_LEN: usize = 12;
const MAX_CODE_LEN: usize = 64;
const CODE_ATTEMPTS: usize = 5;

/// Código público: 12 hex maiúsculos (48 bits aleatórios do UUID v4).
pub fn generate_code() -> String {
    Uuid::new_v4().simple().to_string()[..CODE_LEN].to_uppercase()
}

// Formato aceito na consulta. Fora disso o código é tratado como inexistente,
// sem distinguir "malformado" de "não encontrado".
fn is_well_formed(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[derive(Clone)]
pub struct ValidationService {
    backend: Arc<dyn Backend>,
    timeout: Duration,
    public_base_url: String,
}

impl ValidationService {
    pub fn new(backend: Arc<dyn Backend>, timeout: Duration, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            backend,
            timeout,
            public_base_url,
        }
    }

    // --- Consulta pública (sem autenticação) ---

    pub async fn resolve_document(&self, code: &str) -> Result<Option<DocumentValidation>, AppError> {
        if !is_well_formed(code) {
            return Ok(None);
        }
        with_timeout(self.timeout, self.backend.find_document_validation(code)).await
    }

    pub async fn resolve_certificate(&self, code: &str) -> Result<Option<CertificateValidation>, AppError> {
        if !is_well_formed(code) {
            return Ok(None);
        }
        with_timeout(self.timeout, self.backend.find_certificate_validation(code)).await
    }

    // --- Emissão ---

    async fn fresh_code(&self, kind: ValidationKind) -> Result<String, AppError> {
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_code();
            let taken = match kind {
                ValidationKind::Documents => self.resolve_document(&code).await?.is_some(),
                ValidationKind::Certificates => self.resolve_certificate(&code).await?.is_some(),
            };
            if !taken {
                return Ok(code);
            }
        }
        Err(AppError::InternalServerError(anyhow::anyhow!(
            "não foi possível gerar um código de validação livre"
        )))
    }

    pub async fn issue_document(
        &self,
        business_id: Uuid,
        payload: IssueDocumentPayload,
    ) -> Result<DocumentValidation, AppError> {
        let record = DocumentValidation {
            id: Uuid::new_v4(),
            business_id,
            document_name: payload.document_name.trim().to_string(),
            document_type: payload.document_type.trim().to_string(),
            issued_date: Utc::now(),
            issuer: normalize_optional(payload.issuer.as_deref()),
            validation_code: self.fresh_code(ValidationKind::Documents).await?,
            is_valid: true,
        };

        with_timeout(self.timeout, self.backend.insert_document_validation(&record)).await?;
        tracing::info!("Documento {} emitido no negócio {}", record.validation_code, business_id);
        Ok(record)
    }

    pub async fn issue_certificate(
        &self,
        business_id: Uuid,
        payload: IssueCertificatePayload,
    ) -> Result<CertificateValidation, AppError> {
        let record = CertificateValidation {
            id: Uuid::new_v4(),
            business_id,
            employee_name: payload.employee_name.trim().to_string(),
            nr_number: payload.nr_number.trim().to_string(),
            nr_title: payload.nr_title.trim().to_string(),
            exam_date: payload.exam_date,
            issue_date: payload.issue_date.unwrap_or_else(|| Utc::now().date_naive()),
            issuer_name: payload.issuer_name.trim().to_string(),
            issuer_crea: normalize_optional(payload.issuer_crea.as_deref()),
            issuer_cft_eletrotecnico: normalize_optional(payload.issuer_cft_eletrotecnico.as_deref()),
            issuer_cft_mecanico: normalize_optional(payload.issuer_cft_mecanico.as_deref()),
            validation_code: self.fresh_code(ValidationKind::Certificates).await?,
            is_valid: true,
        };

        with_timeout(self.timeout, self.backend.insert_certificate_validation(&record)).await?;
        tracing::info!("Certificado {} emitido no negócio {}", record.validation_code, business_id);
        Ok(record)
    }

    /// Só desliga o flag de validade; repetir não tem efeito extra.
    pub async fn invalidate(&self, kind: ValidationKind, business_id: Uuid, code: &str) -> Result<(), AppError> {
        if !is_well_formed(code) {
            return Err(AppError::NotFound);
        }

        let found = with_timeout(
            self.timeout,
            self.backend.invalidate_validation(kind, business_id, code),
        )
        .await?;
        if !found {
            return Err(AppError::NotFound);
        }

        tracing::info!("Validação {} invalidada no negócio {}", code, business_id);
        Ok(())
    }

    // --- QR code ---

    pub fn public_url(&self, kind: ValidationKind, code: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, kind.public_prefix(), code)
    }

    /// PNG com a URL pública do registro. O código precisa pertencer ao negócio.
    pub async fn qr_png(&self, kind: ValidationKind, business_id: Uuid, code: &str) -> Result<Vec<u8>, AppError> {
        let owner = match kind {
            ValidationKind::Documents => self.resolve_document(code).await?.map(|r| r.business_id),
            ValidationKind::Certificates => self.resolve_certificate(code).await?.map(|r| r.business_id),
        };
        if owner != Some(business_id) {
            return Err(AppError::NotFound);
        }

        render_qr_png(&self.public_url(kind, code))
    }
}

pub fn render_qr_png(content: &str) -> Result<Vec<u8>, AppError> {
    let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::H)
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

    // Renderiza para imagem
    let image_buffer = code.render::<Luma<u8>>().min_dimensions(256, 256).build();
    let dynamic_image = DynamicImage::ImageLuma8(image_buffer);

    let mut buffer = Vec::new();
    dynamic_image
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{backend::NewAccount, MemoryBackend};
    use chrono::NaiveDate;

    async fn setup() -> Result<(ValidationService, Uuid), AppError> {
        let backend = Arc::new(MemoryBackend::new());
        let owner = backend
            .create_account(NewAccount {
                email: "dono@sst.com".into(),
                password_hash: "x".into(),
                name: None,
                plan: None,
                admin: false,
            })
            .await?;
        let business = backend.create_business(owner.id, "Clínica", None).await?;
        let service = ValidationService::new(backend, Duration::from_secs(1), "https://sst.example/");
        Ok((service, business.id))
    }

    fn document() -> IssueDocumentPayload {
        IssueDocumentPayload {
            document_name: "PGR 2025".into(),
            document_type: "PGR".into(),
            issuer: Some("  Eng. Ana  ".into()),
        }
    }

    #[test]
    fn generated_codes_are_uppercase_hex() {
        let code = generate_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        assert!(is_well_formed(&code));
    }

    #[test]
    fn malformed_codes() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("abc def"));
        assert!(!is_well_formed("../etc"));
        assert!(!is_well_formed(&"A".repeat(65)));
        assert!(is_well_formed("DOC-2024-01"));
    }

    #[tokio::test]
    async fn issued_document_resolves_by_exact_code() -> Result<(), AppError> {
        let (service, business) = setup().await?;
        let issued = service.issue_document(business, document()).await?;

        assert_eq!(issued.issuer.as_deref(), Some("Eng. Ana"));
        let found = service.resolve_document(&issued.validation_code).await?;
        assert_eq!(found, Some(issued.clone()));

        // sem transformação na consulta
        let lower = issued.validation_code.to_lowercase();
        if lower != issued.validation_code {
            assert_eq!(service.resolve_document(&lower).await?, None);
        }
        Ok(())
    }

    #[tokio::test]
    async fn unknown_and_malformed_codes_look_the_same() -> Result<(), AppError> {
        let (service, _) = setup().await?;

        assert_eq!(service.resolve_document("000000000000").await?, None);
        assert_eq!(service.resolve_document("não é código").await?, None);
        assert_eq!(service.resolve_certificate("000000000000").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn invalidation_only_flips_the_flag() -> Result<(), AppError> {
        let (service, business) = setup().await?;
        let issued = service
            .issue_certificate(
                business,
                IssueCertificatePayload {
                    employee_name: "Maria Souza".into(),
                    nr_number: "NR-35".into(),
                    nr_title: "Trabalho em Altura".into(),
                    exam_date: NaiveDate::from_ymd_opt(2025, 3, 10).ok_or(AppError::NotFound)?,
                    issue_date: None,
                    issuer_name: "Eng. Carlos".into(),
                    issuer_crea: Some("123456/SP".into()),
                    issuer_cft_eletrotecnico: None,
                    issuer_cft_mecanico: Some("".into()),
                },
            )
            .await?;

        service.invalidate(ValidationKind::Certificates, business, &issued.validation_code).await?;
        service.invalidate(ValidationKind::Certificates, business, &issued.validation_code).await?;

        let after = service
            .resolve_certificate(&issued.validation_code)
            .await?
            .ok_or(AppError::NotFound)?;
        assert_eq!(after, CertificateValidation { is_valid: false, ..issued });
        Ok(())
    }

    #[tokio::test]
    async fn other_business_cannot_invalidate_or_render() -> Result<(), AppError> {
        let (service, business) = setup().await?;
        let issued = service.issue_document(business, document()).await?;
        let stranger = Uuid::new_v4();

        let result = service
            .invalidate(ValidationKind::Documents, stranger, &issued.validation_code)
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));

        let result = service.qr_png(ValidationKind::Documents, stranger, &issued.validation_code).await;
        assert!(matches!(result, Err(AppError::NotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn qr_is_a_png_of_the_public_url() -> Result<(), AppError> {
        let (service, business) = setup().await?;
        let issued = service.issue_document(business, document()).await?;

        assert_eq!(
            service.public_url(ValidationKind::Documents, &issued.validation_code),
            format!("https://sst.example/validate-doc/{}", issued.validation_code)
        );

        let png = service
            .qr_png(ValidationKind::Documents, business, &issued.validation_code)
            .await?;
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        Ok(())
    }
}
