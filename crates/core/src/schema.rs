//! Declarative field and column schemas for the managed collections.
//!
//! A [`CollectionSchema`] is the single declaration a tabular screen is built
//! from: which columns it shows (and which Record field each is projected
//! from), which fields its edit dialog exposes, how the status column is
//! colour-coded, and how many rows fit on a page.

use serde::{Deserialize, Serialize};

use crate::collection::{Collection, OWNER_FIELD};

/// Rows per page in the admin-facing tables.
pub const ADMIN_PAGE_SIZE: usize = 20;

/// Rows per page in the student-facing read-only tables.
pub const STUDENT_PAGE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Field definitions (edit dialog)
// ---------------------------------------------------------------------------

/// Input kind of an editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Enum,
}

/// One bound input in the edit dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Row key the input is bound to (matches a [`ColumnDef::key`]).
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Allowed values for `Enum` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldDef {
    pub fn text(key: &str, label: &str, required: bool) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: FieldKind::Text,
            required,
            options: vec![],
        }
    }

    pub fn number(key: &str, label: &str, required: bool) -> Self {
        Self {
            kind: FieldKind::Number,
            ..Self::text(key, label, required)
        }
    }

    pub fn date(key: &str, label: &str, required: bool) -> Self {
        Self {
            kind: FieldKind::Date,
            ..Self::text(key, label, required)
        }
    }

    pub fn enumeration(key: &str, label: &str, options: &[&str]) -> Self {
        Self {
            kind: FieldKind::Enum,
            options: options.iter().map(|o| (*o).to_string()).collect(),
            ..Self::text(key, label, true)
        }
    }
}

// ---------------------------------------------------------------------------
// Column definitions (grid)
// ---------------------------------------------------------------------------

/// One grid column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    /// RowViewModel key.
    pub key: String,
    /// Header text, also used as the CSV header.
    pub label: String,
    /// Record field this column is projected from. `None` for computed and
    /// action columns, which have no backing field.
    pub source: Option<String>,
    /// Whether the column may appear in a CSV export.
    pub exportable: bool,
    pub sortable: bool,
}

impl ColumnDef {
    pub fn field(key: &str, label: &str, source: &str) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            source: Some(source.into()),
            exportable: true,
            sortable: true,
        }
    }

    pub fn actions() -> Self {
        Self {
            key: "actions".into(),
            label: "Actions".into(),
            source: None,
            exportable: false,
            sortable: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Status colour coding
// ---------------------------------------------------------------------------

/// Colour family a status value is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Positive,
    Warning,
    Negative,
    #[default]
    Neutral,
}

/// Which column drives the row colour, and how its values map to tones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDisplay {
    pub column: String,
    pub tones: Vec<(String, StatusTone)>,
}

impl StatusDisplay {
    pub fn new(column: &str, tones: &[(&str, StatusTone)]) -> Self {
        Self {
            column: column.into(),
            tones: tones.iter().map(|(v, t)| ((*v).to_string(), *t)).collect(),
        }
    }

    /// Tone for a status value (case-insensitive); unknown values are neutral.
    pub fn tone_for(&self, value: &str) -> StatusTone {
        self.tones
            .iter()
            .find(|(v, _)| v.eq_ignore_ascii_case(value))
            .map(|(_, t)| *t)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Collection schema
// ---------------------------------------------------------------------------

/// Who a screen is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Full collection, editable.
    Admin,
    /// Scoped to the signed-in student's own records, read-only.
    Student,
}

/// Complete declaration of one tabular screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub collection: Collection,
    pub audience: Audience,
    pub columns: Vec<ColumnDef>,
    pub editor: Vec<FieldDef>,
    pub status: Option<StatusDisplay>,
    pub page_size: usize,
}

impl CollectionSchema {
    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn editor_field(&self, key: &str) -> Option<&FieldDef> {
        self.editor.iter().find(|f| f.key == key)
    }

    /// Record field backing a row key. Falls back to the key itself for
    /// editor fields that have no grid column.
    pub fn source_for<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        match self.column(key) {
            Some(col) => col.source.as_deref(),
            None => self.editor_field(key).map(|f| f.key.as_str()),
        }
    }

    /// Columns that carry a backing field, in display order.
    pub fn projected_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.source.is_some())
    }

    pub fn read_only(&self) -> bool {
        self.audience == Audience::Student
    }

    pub fn tone_for(&self, value: &str) -> StatusTone {
        self.status
            .as_ref()
            .map(|s| s.tone_for(value))
            .unwrap_or_default()
    }

    /// Derive the student-facing read-only variant of an admin schema.
    fn student_view(mut self) -> Self {
        self.name = format!("{}-student", self.collection.slug());
        self.audience = Audience::Student;
        self.columns.retain(|c| c.source.is_some());
        self.editor.clear();
        self.page_size = STUDENT_PAGE_SIZE;
        self
    }
}

// ---------------------------------------------------------------------------
// Built-in schemas
// ---------------------------------------------------------------------------

fn owner_column() -> ColumnDef {
    ColumnDef::field("student_id", "Student ID", OWNER_FIELD)
}

/// Admin student roster.
pub fn students_schema() -> CollectionSchema {
    CollectionSchema {
        name: "students-admin".into(),
        collection: Collection::Students,
        audience: Audience::Admin,
        columns: vec![
            owner_column(),
            ColumnDef::field("name", "Name", "name"),
            ColumnDef::field("email", "Email", "email"),
            ColumnDef::field("department", "Department", "department"),
            ColumnDef::field("phone", "Phone", "phoneNumber"),
            ColumnDef::field("status", "Status", "status"),
            ColumnDef::actions(),
        ],
        editor: vec![
            FieldDef::text("name", "Name", true),
            FieldDef::text("email", "Email", true),
            FieldDef::text("department", "Department", false),
            FieldDef::text("phone", "Phone", false),
            FieldDef::enumeration("status", "Status", &["Active", "Suspended", "Graduated"]),
        ],
        status: Some(StatusDisplay::new(
            "status",
            &[
                ("Active", StatusTone::Positive),
                ("Suspended", StatusTone::Negative),
                ("Graduated", StatusTone::Neutral),
            ],
        )),
        page_size: ADMIN_PAGE_SIZE,
    }
}

/// Admin offense list.
pub fn offenses_schema() -> CollectionSchema {
    CollectionSchema {
        name: "offenses-admin".into(),
        collection: Collection::OffenseList,
        audience: Audience::Admin,
        columns: vec![
            owner_column(),
            ColumnDef::field("offense", "Offense", "offenseType"),
            ColumnDef::field("description", "Description", "description"),
            ColumnDef::field("date", "Date", "offenseDate"),
            ColumnDef::field("fine", "Fine", "fineAmount"),
            ColumnDef::field("status", "Status", "status"),
            ColumnDef::actions(),
        ],
        editor: vec![
            FieldDef::text("offense", "Offense", true),
            FieldDef::text("description", "Description", false),
            FieldDef::date("date", "Date", true),
            FieldDef::number("fine", "Fine", false),
            FieldDef::enumeration("status", "Status", &["Pending", "Resolved"]),
        ],
        status: Some(StatusDisplay::new(
            "status",
            &[
                ("Pending", StatusTone::Warning),
                ("Resolved", StatusTone::Positive),
            ],
        )),
        page_size: ADMIN_PAGE_SIZE,
    }
}

/// Admin borrowed-book list.
pub fn borrowed_books_schema() -> CollectionSchema {
    CollectionSchema {
        name: "borrowed-books-admin".into(),
        collection: Collection::BorrowedBooks,
        audience: Audience::Admin,
        columns: vec![
            owner_column(),
            ColumnDef::field("book_title", "Book Title", "bookTitle"),
            ColumnDef::field("isbn", "ISBN", "isbn"),
            ColumnDef::field("borrowed_on", "Borrowed On", "borrowDate"),
            ColumnDef::field("due_on", "Due On", "dueDate"),
            ColumnDef::field("status", "Status", "status"),
            ColumnDef::actions(),
        ],
        editor: vec![
            FieldDef::text("book_title", "Book Title", true),
            FieldDef::text("isbn", "ISBN", false),
            FieldDef::date("due_on", "Due On", true),
            FieldDef::enumeration("status", "Status", &["Borrowed", "Returned", "Overdue"]),
        ],
        status: Some(StatusDisplay::new(
            "status",
            &[
                ("Borrowed", StatusTone::Warning),
                ("Returned", StatusTone::Positive),
                ("Overdue", StatusTone::Negative),
            ],
        )),
        page_size: ADMIN_PAGE_SIZE,
    }
}

/// Admin payment list.
pub fn payments_schema() -> CollectionSchema {
    CollectionSchema {
        name: "payments-admin".into(),
        collection: Collection::PaymentList,
        audience: Audience::Admin,
        columns: vec![
            owner_column(),
            ColumnDef::field("amount", "Amount", "amount"),
            ColumnDef::field("reference", "Reference", "referenceNumber"),
            ColumnDef::field("paid_on", "Paid On", "paymentDate"),
            ColumnDef::field("status", "Status", "status"),
            ColumnDef::actions(),
        ],
        editor: vec![
            FieldDef::number("amount", "Amount", true),
            FieldDef::text("reference", "Reference", false),
            FieldDef::date("paid_on", "Paid On", false),
            FieldDef::enumeration("status", "Status", &["Paid", "Unpaid", "Partial"]),
        ],
        status: Some(StatusDisplay::new(
            "status",
            &[
                ("Paid", StatusTone::Positive),
                ("Partial", StatusTone::Warning),
                ("Unpaid", StatusTone::Negative),
            ],
        )),
        page_size: ADMIN_PAGE_SIZE,
    }
}

/// Admin notice board. Students read notices through the notice feed
/// rather than a grid.
pub fn notices_schema() -> CollectionSchema {
    CollectionSchema {
        name: "notices-admin".into(),
        collection: Collection::Notices,
        audience: Audience::Admin,
        columns: vec![
            ColumnDef::field("title", "Title", "title"),
            ColumnDef::field("message", "Message", "message"),
            ColumnDef::field("posted_at", "Posted At", "postedAt"),
            ColumnDef::actions(),
        ],
        editor: vec![
            FieldDef::text("title", "Title", true),
            FieldDef::text("message", "Message", true),
            FieldDef::date("posted_at", "Posted At", true),
        ],
        status: None,
        page_size: ADMIN_PAGE_SIZE,
    }
}

/// Student's own offenses, read-only.
pub fn student_offenses_schema() -> CollectionSchema {
    offenses_schema().student_view()
}

/// Student's own borrowed books, read-only.
pub fn student_borrowed_books_schema() -> CollectionSchema {
    borrowed_books_schema().student_view()
}

/// Look up the built-in schema for a collection and audience.
pub fn schema_for(collection: Collection, audience: Audience) -> Option<CollectionSchema> {
    match (collection, audience) {
        (Collection::Students, Audience::Admin) => Some(students_schema()),
        (Collection::OffenseList, Audience::Admin) => Some(offenses_schema()),
        (Collection::BorrowedBooks, Audience::Admin) => Some(borrowed_books_schema()),
        (Collection::PaymentList, Audience::Admin) => Some(payments_schema()),
        (Collection::Notices, Audience::Admin) => Some(notices_schema()),
        (Collection::OffenseList, Audience::Student) => Some(student_offenses_schema()),
        (Collection::BorrowedBooks, Audience::Student) => Some(student_borrowed_books_schema()),
        (Collection::PaymentList, Audience::Student) => Some(payments_schema().student_view()),
        _ => None,
    }
}
