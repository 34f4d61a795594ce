// src/services/invoice_service.rs

use std::path::PathBuf;

use chrono::{DateTime, Datelike, Utc};
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ConversationRepository,
    models::{
        conversation::{Conversation, SalesStage},
        invoice::{Invoice, InvoiceLine},
    },
};

pub const SUBSCRIPTION_DESCRIPTION: &str = "Suscripción Mensual - Acceso Total Studyx";
const FONT_FAMILY: &str = "Roboto";

const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre", "octubre",
    "noviembre", "diciembre",
];

pub fn subscription_price() -> Decimal {
    Decimal::new(2500, 2)
}

/// Fatura de uma conversa que já passou pela confirmação de pagamento.
pub fn build_invoice(conversation: &Conversation) -> Result<Invoice, AppError> {
    if conversation.sales_stage != SalesStage::Finalizado {
        return Err(AppError::InvoiceUnavailable);
    }

    let lines = vec![InvoiceLine {
        description: SUBSCRIPTION_DESCRIPTION.to_string(),
        amount: subscription_price(),
    }];
    let subtotal: Decimal = lines.iter().map(|l| l.amount).sum();
    let taxes = Decimal::ZERO;

    Ok(Invoice {
        // O carimbo da última atualização é estável entre consultas
        number: format!("INV-{}", conversation.updated_at.timestamp_millis()),
        conversation_id: conversation.id,
        issued_at: conversation.updated_at,
        bill_to: conversation.customer(),
        lines,
        subtotal,
        taxes,
        total: subtotal + taxes,
    })
}

pub fn format_date_es(date: DateTime<Utc>) -> String {
    format!("{} de {} de {}", date.day(), MONTHS_ES[date.month0() as usize], date.year())
}

fn money(value: Decimal) -> String {
    format!("${:.2}", value)
}

#[derive(Clone)]
pub struct InvoiceService {
    conversation_repo: ConversationRepository,
    fonts_dir: PathBuf,
    app_base_url: String,
}

impl InvoiceService {
    pub fn new(conversation_repo: ConversationRepository, fonts_dir: PathBuf, app_base_url: String) -> Self {
        Self { conversation_repo, fonts_dir, app_base_url }
    }

    pub async fn invoice_for(&self, conversation_id: Uuid) -> Result<Invoice, AppError> {
        let conversation = self
            .conversation_repo
            .find_by_id(conversation_id)
            .await?
            .ok_or(AppError::ConversationNotFound)?;
        build_invoice(&conversation)
    }

    pub async fn invoice_pdf(&self, conversation_id: Uuid) -> Result<(Invoice, Vec<u8>), AppError> {
        let invoice = self.invoice_for(conversation_id).await?;

        // genpdf é síncrono e pesado
        let service = self.clone();
        let for_render = invoice.clone();
        let pdf = tokio::task::spawn_blocking(move || service.render_pdf(&for_render))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de renderização do PDF: {}", e))??;

        Ok((invoice, pdf))
    }

    fn render_pdf(&self, invoice: &Invoice) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None).map_err(|_| {
            AppError::FontNotFound(format!("Fonte {} não encontrada em {}", FONT_FAMILY, self.fonts_dir.display()))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Factura {}", invoice.number));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(elements::Paragraph::new("Studyx").styled(style::Style::new().bold().with_font_size(22)));
        doc.push(
            elements::Paragraph::new(format!("FACTURA {}", invoice.number))
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Paragraph::new(format!(
            "Fecha de factura: {}",
            format_date_es(invoice.issued_at)
        )));
        doc.push(elements::Break::new(1.5));

        // --- CLIENTE ---
        let bill_to = &invoice.bill_to;
        doc.push(elements::Paragraph::new("FACTURAR A:").styled(style::Style::new().bold()));
        for line in [
            bill_to.display_name(),
            bill_to.email.as_deref(),
            bill_to.phone.as_deref(),
            bill_to.estado.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            doc.push(elements::Paragraph::new(line));
        }
        doc.push(elements::Break::new(1.5));

        // --- ITENS ---
        let mut table = elements::TableLayout::new(vec![4, 1]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Descripción").styled(bold))
            .element(elements::Paragraph::new("Monto").styled(bold))
            .push()
            .map_err(|e| anyhow::anyhow!("Erro na tabela da fatura: {}", e))?;

        for line in &invoice.lines {
            table
                .row()
                .element(elements::Paragraph::new(line.description.as_str()))
                .element(elements::Paragraph::new(money(line.amount)))
                .push()
                .map_err(|e| anyhow::anyhow!("Erro na linha da fatura: {}", e))?;
        }
        doc.push(table);
        doc.push(elements::Break::new(1.5));

        // --- TOTAIS ---
        for (label, value) in [("Subtotal", invoice.subtotal), ("Impuestos", invoice.taxes)] {
            let mut paragraph = elements::Paragraph::new(format!("{}: {}", label, money(value)));
            paragraph.set_alignment(genpdf::Alignment::Right);
            doc.push(paragraph);
        }
        let mut total = elements::Paragraph::new(format!("TOTAL PAGADO: {}", money(invoice.total)));
        total.set_alignment(genpdf::Alignment::Right);
        doc.push(total.styled(style::Style::new().bold().with_font_size(12)));
        doc.push(elements::Break::new(2));

        // --- QR DE VERIFICAÇÃO ---
        let verify_url = format!(
            "{}/api/conversations/{}/invoice",
            self.app_base_url.trim_end_matches('/'),
            invoice.conversation_id
        );
        let code = QrCode::new(verify_url.as_bytes())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let pdf_image = elements::Image::from_dynamic_image(image::DynamicImage::ImageLuma8(image_buffer))
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);

        doc.push(elements::Break::new(1));
        doc.push(
            elements::Paragraph::new("¡Gracias por tu confianza en Studyx!")
                .styled(style::Style::new().italic().with_font_size(9)),
        );

        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::types::Json;

    use crate::models::conversation::{ConversationStatus, CustomerData, Message};

    fn conversation(stage: SalesStage) -> Conversation {
        let at = Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).unwrap();
        Conversation {
            id: Uuid::new_v4(),
            messages: Json(vec![Message::model("Hola")]),
            status: ConversationStatus::Cerrado,
            advisor_name: "Sofía".into(),
            sales_stage: stage,
            customer_data: Some(Json(CustomerData {
                nombre: Some("Juan Perez".into()),
                email: Some("juan@test.com".into()),
                ..Default::default()
            })),
            lead_capture: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn finalized_conversations_get_a_paid_invoice() {
        let conversation = conversation(SalesStage::Finalizado);
        let invoice = build_invoice(&conversation).unwrap();

        assert_eq!(invoice.number, format!("INV-{}", conversation.updated_at.timestamp_millis()));
        assert_eq!(invoice.total, Decimal::new(2500, 2));
        assert_eq!(invoice.taxes, Decimal::ZERO);
        assert_eq!(invoice.lines[0].description, SUBSCRIPTION_DESCRIPTION);
        assert_eq!(invoice.bill_to.nombre.as_deref(), Some("Juan Perez"));
        assert_eq!(money(invoice.total), "$25.00");
    }

    #[test]
    fn invoice_waits_for_payment() {
        let err = build_invoice(&conversation(SalesStage::EsperandoPago)).unwrap_err();
        assert!(matches!(err, AppError::InvoiceUnavailable));
    }

    #[test]
    fn spanish_long_date() {
        let date = Utc.with_ymd_and_hms(2024, 6, 12, 0, 0, 0).unwrap();
        assert_eq!(format_date_es(date), "12 de junio de 2024");
    }
}
