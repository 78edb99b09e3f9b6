use crate::calendar::{
    layout::{time_label, visual_class, VisualClass},
    strip_id_prefix, Appointment,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub appointment_id: String,
    pub time_label: String,
    pub name: String,
    pub phone: String,
    pub doctor: String,
    pub state_label: String,
    pub remark: String,
    pub visual: VisualClass,
}

/// Flat, time-ordered rendition of a day for the list display mode. Unlike the
/// grid, nothing is clipped here.
pub fn build_list(appointments: &[Appointment], placeholder_doctor: &str) -> Vec<ListEntry> {
    let mut ordered: Vec<&Appointment> = appointments.iter().collect();
    ordered.sort_by_key(|a| a.date);

    ordered
        .into_iter()
        .map(|a| ListEntry {
            appointment_id: a.id.clone(),
            time_label: time_label(a.hour(), a.minute(), a.duration_minutes),
            name: strip_id_prefix(&a.partner_display_name),
            phone: a.partner_phone.clone(),
            doctor: a.doctor_label().unwrap_or(placeholder_doctor).to_string(),
            state_label: a.state.label().to_string(),
            remark: a.remark().to_string(),
            visual: visual_class(&a.state, &a.color_tag),
        })
        .collect()
}

pub fn filter_list<'a>(entries: &'a [ListEntry], query: &str) -> Vec<&'a ListEntry> {
    let query = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| {
            query.is_empty()
                || e.name.to_lowercase().contains(&query)
                || e.phone.to_lowercase().contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::AppointmentState;
    use chrono::NaiveDate;

    fn appt(id: &str, name: &str, hour: u32, state: AppointmentState) -> Appointment {
        Appointment {
            id: id.to_string(),
            partner_id: None,
            partner_display_name: name.to_string(),
            partner_phone: format!("09{}", id),
            date: NaiveDate::from_ymd_opt(2025, 3, 2)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            duration_minutes: 30,
            doctor: None,
            doctor_name: None,
            state,
            color_tag: String::new(),
            note: None,
            reason: None,
        }
    }

    #[test]
    fn list_is_sorted_by_start_time() {
        let entries = build_list(
            &[
                appt("2", "B", 14, AppointmentState::Confirmed),
                appt("1", "A", 8, AppointmentState::Done),
            ],
            "unspecified",
        );

        let ids: Vec<&str> = entries.iter().map(|e| e.appointment_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(entries[0].visual, VisualClass::Completed);
        assert_eq!(entries[0].doctor, "unspecified");
    }

    #[test]
    fn list_keeps_appointments_outside_grid_hours() {
        let entries = build_list(&[appt("1", "Night", 23, AppointmentState::Confirmed)], "-");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn list_names_are_cleaned() {
        let entries = build_list(&[appt("1", "[T88] Le Thi Huong", 9, AppointmentState::Cancel)], "-");
        assert_eq!(entries[0].name, "Le Thi Huong");
        assert_eq!(entries[0].state_label, "Hủy hẹn");
    }

    #[test]
    fn filter_matches_name_or_phone() {
        let entries = build_list(
            &[
                appt("1", "Nguyen Van An", 8, AppointmentState::Confirmed),
                appt("2", "Pham Thi Mai", 9, AppointmentState::Confirmed),
            ],
            "-",
        );

        assert_eq!(filter_list(&entries, "mai").len(), 1);
        assert_eq!(filter_list(&entries, "091").len(), 1);
        assert_eq!(filter_list(&entries, "").len(), 2);
    }
}
