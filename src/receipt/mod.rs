//! Receipt assembly: decide which sections a record gets, then lay them out
//! top to bottom, threading the cursor from one section into the next.

pub mod pagination;
pub mod sections;
pub mod table;

use crate::config::ReceiptOptions;
use crate::error::Error;
use crate::model::ReceiptData;
use crate::pdf::canvas::Canvas;

use sections::{
    AttachmentLine, Field, LABEL_WIDTH, LEFT_X, LayoutWarning, SectionRenderer, TRAILING_GAP,
};

const PERMIT_LABEL_WIDTH: f32 = 45.0;
/// Attachments start on a new page when less than this is left above the
/// page's bottom edge.
const ATTACHMENTS_MIN_SPACE: f32 = 60.0;
/// Attachment rows sit a little lower under their header than other rows.
const ATTACHMENTS_EXTRA_GAP: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionId {
    Header,
    StatusBadge,
    DeceasedInfo,
    NextOfKin,
    BurialServices,
    PaymentVerification,
    BurialPermit,
    ApplicantDetails,
    Attachments,
    Footer,
}

impl SectionId {
    pub fn title(self) -> &'static str {
        match self {
            SectionId::Header => "Header",
            SectionId::StatusBadge => "Status",
            SectionId::DeceasedInfo => "Deceased Information",
            SectionId::NextOfKin => "Next of Kin",
            SectionId::BurialServices => "Burial & Services",
            SectionId::PaymentVerification => "Payment Verification",
            SectionId::BurialPermit => "Burial Permit",
            SectionId::ApplicantDetails => "Applicant Details",
            SectionId::Attachments => "Attachments",
            SectionId::Footer => "Footer",
        }
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Ordered section list for a record. Optional sections appear only when
/// the data that governs them is present.
pub fn plan_sections(data: &ReceiptData) -> Vec<SectionId> {
    let mut plan = vec![
        SectionId::Header,
        SectionId::StatusBadge,
        SectionId::DeceasedInfo,
        SectionId::NextOfKin,
        SectionId::BurialServices,
    ];
    if present(&data.payment.receipt_no) || present(&data.payment.payment_ref) {
        plan.push(SectionId::PaymentVerification);
    }
    if present(&data.permit.number) {
        plan.push(SectionId::BurialPermit);
    }
    if present(&data.applicant.name) || present(&data.applicant.email) {
        plan.push(SectionId::ApplicantDetails);
    }
    if !data.attachments.is_empty() {
        plan.push(SectionId::Attachments);
    }
    plan.push(SectionId::Footer);
    plan
}

/// A laid-out receipt before export.
pub struct ReceiptLayout {
    pub canvas: Canvas,
    pub sections: Vec<SectionId>,
    pub warnings: Vec<LayoutWarning>,
    pub total: i64,
}

pub struct ReceiptAssembler<'a> {
    data: &'a ReceiptData,
    options: &'a ReceiptOptions,
}

impl<'a> ReceiptAssembler<'a> {
    pub fn new(data: &'a ReceiptData, options: &'a ReceiptOptions) -> Self {
        Self { data, options }
    }

    pub fn assemble(&self, mut canvas: Canvas) -> Result<ReceiptLayout, Error> {
        let sections = plan_sections(self.data);
        log::debug!("Section plan: {sections:?}");

        let mut renderer = SectionRenderer::new(&mut canvas);
        let mut y = 0.0;
        let mut total = 0;
        for &section in &sections {
            match section {
                SectionId::Header => y = self.header(&mut renderer)?,
                SectionId::StatusBadge => {
                    y = renderer.status_badge(
                        &self.data.status,
                        self.data.rejection_reason.as_deref(),
                        y,
                    )?
                }
                SectionId::DeceasedInfo => y = self.deceased(&mut renderer, y)?,
                SectionId::NextOfKin => y = self.next_of_kin(&mut renderer, y)?,
                SectionId::BurialServices => {
                    let (cursor, sum) = self.burial_services(&mut renderer, y)?;
                    y = cursor;
                    total = sum;
                }
                SectionId::PaymentVerification => y = self.payment(&mut renderer, y)?,
                SectionId::BurialPermit => y = self.permit(&mut renderer, y)?,
                SectionId::ApplicantDetails => y = self.applicant(&mut renderer, y)?,
                SectionId::Attachments => y = self.attachments(&mut renderer, y)?,
                SectionId::Footer => self.footers(&mut renderer)?,
            }
        }

        let warnings = renderer.into_warnings();
        Ok(ReceiptLayout {
            canvas,
            sections,
            warnings,
            total,
        })
    }

    fn header(&self, r: &mut SectionRenderer) -> Result<f32, Error> {
        let at = self.options.generated_at();
        let date = at.format(&self.options.header_date_format).to_string();
        let time = at.format(&self.options.header_time_format).to_string();
        r.document_header(&self.options.branding, &date, &time)
    }

    fn deceased(&self, r: &mut SectionRenderer, y: f32) -> Result<f32, Error> {
        let d = &self.data.deceased;
        let left = [
            Field::new("Full Name", d.full_name.as_deref()),
            Field::new("Gender", d.gender.as_deref()),
            Field::new("Date of Death", d.date_of_death.as_deref()),
        ];
        let right = [
            Field::new("ID/Passport", d.id_passport.as_deref()),
            Field::new("Age", d.age.as_deref()),
            Field::new("Date of Burial", d.date_of_burial.as_deref()),
        ];
        let block = r.two_column_height(&left, &right)?;
        let y = r.begin_section(SectionId::DeceasedInfo.title(), block, y)?;
        r.two_columns(&left, &right, y)
    }

    fn next_of_kin(&self, r: &mut SectionRenderer, y: f32) -> Result<f32, Error> {
        let k = &self.data.next_of_kin;
        let mut fields = vec![
            Field::new("Name", k.name.as_deref()),
            Field::new("Relationship", k.relationship.as_deref()),
            Field::new("Contact", k.contact.as_deref()),
        ];
        if present(&k.id_passport) {
            fields.push(Field::new("ID/Passport", k.id_passport.as_deref()));
        }
        self.single_column(r, SectionId::NextOfKin, &fields, LABEL_WIDTH, y)
    }

    fn single_column(
        &self,
        r: &mut SectionRenderer,
        section: SectionId,
        fields: &[Field],
        label_width: f32,
        y: f32,
    ) -> Result<f32, Error> {
        let first = match fields.first() {
            Some(f) => r.row_height(&f.value, LEFT_X, label_width)?,
            None => 0.0,
        };
        let y = r.begin_section(section.title(), first, y)?;
        let y = r.rows(fields, y, LEFT_X, label_width)?;
        Ok(y + TRAILING_GAP)
    }

    fn burial_services(&self, r: &mut SectionRenderer, y: f32) -> Result<(f32, i64), Error> {
        let location = Field::new("Location", self.data.burial_location.as_deref());
        let first = r.row_height(&location.value, LEFT_X, LABEL_WIDTH)?;
        let y = r.begin_section(SectionId::BurialServices.title(), first, y)?;
        let y = r.rows(std::slice::from_ref(&location), y, LEFT_X, LABEL_WIDTH)?;

        let lead = r.services_table_lead(&self.data.services)?;
        let y = r.paginator().ensure_space(r.canvas_mut(), lead, y);
        let outcome = r.services_table(&self.data.services, &self.options.currency, y)?;
        Ok((outcome.cursor, outcome.total))
    }

    fn payment(&self, r: &mut SectionRenderer, y: f32) -> Result<f32, Error> {
        let p = &self.data.payment;
        let left = [Field::new("Receipt No", p.receipt_no.as_deref())];
        let right = [Field::new("M-Pesa Ref", p.payment_ref.as_deref())];
        let block = r.two_column_height(&left, &right)?;
        let y = r.begin_section(SectionId::PaymentVerification.title(), block, y)?;
        r.two_columns(&left, &right, y)
    }

    fn permit(&self, r: &mut SectionRenderer, y: f32) -> Result<f32, Error> {
        let p = &self.data.permit;
        let fields = [
            Field::new("Permit No", p.number.as_deref()),
            Field::new("Date of Issue", p.issue_date.as_deref()),
            Field::new("Issued By", p.issued_by.as_deref()),
            Field::new("Issued By Contact", p.issued_by_contact.as_deref()),
            Field::new("Issued To", p.issued_to.as_deref()),
            Field::new("Recipient Contact", p.issued_to_contact.as_deref()),
        ];
        self.single_column(r, SectionId::BurialPermit, &fields, PERMIT_LABEL_WIDTH, y)
    }

    fn applicant(&self, r: &mut SectionRenderer, y: f32) -> Result<f32, Error> {
        let a = &self.data.applicant;
        let fields = [
            Field::new("Name", a.name.as_deref()),
            Field::new("Email", a.email.as_deref()),
            Field::new("Phone", a.phone.as_deref()),
        ];
        self.single_column(r, SectionId::ApplicantDetails, &fields, LABEL_WIDTH, y)
    }

    fn attachments(&self, r: &mut SectionRenderer, y: f32) -> Result<f32, Error> {
        let lines: Vec<AttachmentLine> = self
            .data
            .attachments
            .iter()
            .enumerate()
            .map(|(i, a)| AttachmentLine {
                label: a
                    .filename
                    .clone()
                    .unwrap_or_else(|| format!("Document {}", i + 1)),
                url: a.path.as_deref().map(|p| self.options.resolve_url(p)),
                uploaded: a.uploaded_at.clone(),
            })
            .collect();

        let page_height = r.canvas().geometry().height;
        let mut y = y;
        if y > page_height - ATTACHMENTS_MIN_SPACE {
            log::debug!("Attachments: {y:.1}mm is past the attachment threshold, new page");
            y = r.new_page();
        }
        let y = r.begin_section(
            SectionId::Attachments.title(),
            sections::ATTACHMENT_ROW_HEIGHT,
            y,
        )?;
        r.attachment_list(&lines, y + ATTACHMENTS_EXTRA_GAP)
    }

    /// Footer on every page, drawn once the page count is final.
    fn footers(&self, r: &mut SectionRenderer) -> Result<(), Error> {
        let pages = r.canvas().page_count();
        for i in 0..pages {
            r.canvas_mut().set_current_page(i);
            r.footer(&self.options.branding, i + 1, pages)?;
        }
        Ok(())
    }
}
