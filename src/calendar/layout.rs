use serde::{Deserialize, Serialize};

use crate::calendar::{strip_id_prefix, Appointment, AppointmentState};

pub const MIN_CARD_HEIGHT: f64 = 24.0;
/// Cards taller than this also show the phone number.
pub const PHONE_TIER_HEIGHT: f64 = 40.0;
/// Cards taller than this also show the note, when there is one.
pub const NOTE_TIER_HEIGHT: f64 = 55.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    pub pixels_per_hour: f64,
    pub placeholder_doctor: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 22,
            pixels_per_hour: 80.0,
            placeholder_doctor: "unspecified".to_string(),
        }
    }
}

impl GridConfig {
    pub fn hour_count(&self) -> u32 {
        self.end_hour.saturating_sub(self.start_hour) + 1
    }

    pub fn grid_height(&self) -> f64 {
        self.hour_count() as f64 * self.pixels_per_hour
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour <= self.end_hour
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualClass {
    Confirmed,
    Completed,
    Cancelled,
    Warning,
}

impl VisualClass {
    pub fn css_class(&self) -> &'static str {
        match self {
            VisualClass::Confirmed => "cal-confirmed",
            VisualClass::Completed => "cal-done",
            VisualClass::Cancelled => "cal-cancel",
            VisualClass::Warning => "cal-orange",
        }
    }
}

/// `cancel`/`done` win over the color tag; the tag is only read for every
/// other state.
pub fn visual_class(state: &AppointmentState, color_tag: &str) -> VisualClass {
    match state {
        AppointmentState::Cancel => VisualClass::Cancelled,
        AppointmentState::Done => VisualClass::Completed,
        _ => match color_tag.trim() {
            "1" => VisualClass::Cancelled,
            "2" => VisualClass::Warning,
            _ => VisualClass::Confirmed,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardContent {
    pub name: String,
    pub time_label: String,
    pub phone: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentCard {
    pub appointment_id: String,
    pub state: AppointmentState,
    pub top: f64,
    pub height: f64,
    pub visual: VisualClass,
    pub content: CardContent,
    pub phone_number: String,
    pub dimmed: bool,
}

impl AppointmentCard {
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.content.name.to_lowercase().contains(&query)
            || self.phone_number.to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoctorColumn {
    pub doctor: String,
    pub cards: Vec<AppointmentCard>,
}

impl DoctorColumn {
    fn new(doctor: &str) -> Self {
        Self {
            doctor: doctor.to_string(),
            cards: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarLayout {
    pub start_hour: u32,
    pub end_hour: u32,
    pub pixels_per_hour: f64,
    pub grid_height: f64,
    pub hour_labels: Vec<String>,
    /// One column per roster doctor, in roster order.
    pub columns: Vec<DoctorColumn>,
    /// Buckets for doctor names missing from the roster. They get no header
    /// and are not drawn as grid columns.
    pub unlisted: Vec<DoctorColumn>,
    pub appointment_count: usize,
}

impl CalendarLayout {
    pub fn build(doctors: &[String], appointments: &[Appointment], config: &GridConfig) -> Self {
        let mut columns: Vec<DoctorColumn> = Vec::new();
        for doctor in doctors.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
            if !columns.iter().any(|c| c.doctor == doctor) {
                columns.push(DoctorColumn::new(doctor));
            }
        }
        if columns.is_empty() {
            columns.push(DoctorColumn::new(&config.placeholder_doctor));
        }

        let mut unlisted: Vec<DoctorColumn> = Vec::new();

        for appointment in appointments {
            let doctor = appointment
                .doctor_label()
                .unwrap_or(config.placeholder_doctor.as_str());

            let bucket = match columns.iter().position(|c| c.doctor == doctor) {
                Some(i) => &mut columns[i],
                None => match unlisted.iter().position(|c| c.doctor == doctor) {
                    Some(i) => &mut unlisted[i],
                    None => {
                        unlisted.push(DoctorColumn::new(doctor));
                        let last = unlisted.len() - 1;
                        &mut unlisted[last]
                    }
                },
            };

            if let Some(card) = layout_card(appointment, config) {
                bucket.cards.push(card);
            }
        }

        if !unlisted.is_empty() {
            tracing::debug!(
                "{} appointment bucket(s) reference doctors outside the roster",
                unlisted.len()
            );
        }

        Self {
            start_hour: config.start_hour,
            end_hour: config.end_hour,
            pixels_per_hour: config.pixels_per_hour,
            grid_height: config.grid_height(),
            hour_labels: (config.start_hour..=config.end_hour)
                .map(|h| format!("{:02}:00", h))
                .collect(),
            columns,
            unlisted,
            appointment_count: appointments.len(),
        }
    }

    /// Cards drawn in the grid, column by column.
    pub fn cards(&self) -> impl Iterator<Item = &AppointmentCard> {
        self.columns.iter().flat_map(|c| c.cards.iter())
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    pub fn find_card(&self, appointment_id: &str) -> Option<&AppointmentCard> {
        self.cards().find(|card| card.appointment_id == appointment_id)
    }

    /// Dims every card that does not match `query`; an empty query un-dims all.
    pub fn apply_search(&mut self, query: &str) {
        for column in self.columns.iter_mut().chain(self.unlisted.iter_mut()) {
            for card in column.cards.iter_mut() {
                card.dimmed = !card.matches(query);
            }
        }
    }
}

/// Positions one appointment, or `None` when its start hour is outside the grid.
pub fn layout_card(appointment: &Appointment, config: &GridConfig) -> Option<AppointmentCard> {
    let hour = appointment.hour();
    let minute = appointment.minute();
    if !config.contains_hour(hour) {
        return None;
    }

    let pph = config.pixels_per_hour;
    let duration = appointment.duration_minutes;
    let top = (hour - config.start_hour) as f64 * pph + (minute as f64 / 60.0) * pph;
    let height = ((duration as f64 / 60.0) * pph).max(MIN_CARD_HEIGHT);

    let note = appointment.remark();
    let content = CardContent {
        name: strip_id_prefix(&appointment.partner_display_name),
        time_label: time_label(hour, minute, duration),
        phone: (height > PHONE_TIER_HEIGHT).then(|| appointment.partner_phone.clone()),
        note: (height > NOTE_TIER_HEIGHT && !note.is_empty()).then(|| note.to_string()),
    };

    Some(AppointmentCard {
        appointment_id: appointment.id.clone(),
        state: appointment.state.clone(),
        top,
        height,
        visual: visual_class(&appointment.state, &appointment.color_tag),
        content,
        phone_number: appointment.partner_phone.clone(),
        dimmed: false,
    })
}

pub fn time_label(hour: u32, minute: u32, duration_minutes: u32) -> String {
    let end_total = minute.saturating_add(duration_minutes);
    format!(
        "{:02}:{:02} - {:02}:{:02}",
        hour,
        minute,
        hour + end_total / 60,
        end_total % 60
    )
}
