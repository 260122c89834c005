// libs/dashboard-cell/src/services/layout.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use appointment_cell::{Appointment, AppointmentApi};
use shared_api::RestClient;

use crate::models::{
    BreakTimeRow, DashboardError, DaySchedule, DoctorLayout, DoctorProfile, Feedback, TimeRange,
    WorkingHoursRow,
};

pub const WEEK_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const DEFAULT_DAY_START: &str = "09:00";
const DEFAULT_DAY_END: &str = "17:00";

fn hh_mm(time: &str) -> String {
    time.chars().take(5).collect()
}

/// Monday..Sunday; days without a working-hours row are disabled 09:00-17:00.
pub fn weekly_schedule(hours: &[WorkingHoursRow], breaks: &[BreakTimeRow]) -> Vec<DaySchedule> {
    WEEK_DAYS
        .iter()
        .map(|day| {
            let day_breaks = breaks
                .iter()
                .filter(|b| b.day_of_week == *day)
                .map(|b| TimeRange {
                    start: hh_mm(&b.start_time),
                    end: hh_mm(&b.end_time),
                })
                .collect();

            match hours.iter().find(|h| h.day_of_week == *day) {
                Some(row) => DaySchedule {
                    day: day.to_string(),
                    enabled: row.is_available,
                    start: hh_mm(&row.start_time),
                    end: hh_mm(&row.end_time),
                    breaks: day_breaks,
                },
                None => DaySchedule {
                    day: day.to_string(),
                    enabled: false,
                    start: DEFAULT_DAY_START.to_string(),
                    end: DEFAULT_DAY_END.to_string(),
                    breaks: day_breaks,
                },
            }
        })
        .collect()
}

pub struct DoctorLayoutService {
    client: Arc<RestClient>,
    appointments: Arc<dyn AppointmentApi>,
}

impl DoctorLayoutService {
    pub fn new(client: Arc<RestClient>, appointments: Arc<dyn AppointmentApi>) -> Self {
        Self {
            client,
            appointments,
        }
    }

    /// Fetches the five layout resources concurrently. Schedule rows are
    /// optional; everything else must load.
    #[instrument(skip(self))]
    pub async fn load(&self, doctor_id: &str) -> Result<DoctorLayout, DashboardError> {
        let profile_path = format!("/doctors/{}/", doctor_id);
        let hours_path = format!("/doctors/{}/working_hours/", doctor_id);
        let breaks_path = format!("/doctors/{}/break_times/", doctor_id);
        let feedback_path = format!("/doctors/{}/feedback/", doctor_id);

        let (profile, hours, breaks, appointments, feedback) = tokio::join!(
            self.client.get::<DoctorProfile>(&profile_path),
            self.client.get_collection::<WorkingHoursRow>(&hours_path),
            self.client.get_collection::<BreakTimeRow>(&breaks_path),
            self.appointments.list_for_doctor(doctor_id),
            self.client.get_collection::<Feedback>(&feedback_path),
        );

        let profile = profile?;
        let appointments = appointments?;
        let feedback = feedback?;

        let hours = hours.unwrap_or_else(|e| {
            warn!("Working hours unavailable for doctor {}: {}", doctor_id, e);
            Vec::new()
        });
        let breaks = breaks.unwrap_or_else(|e| {
            warn!("Break times unavailable for doctor {}: {}", doctor_id, e);
            Vec::new()
        });

        let now = Utc::now();
        info!(
            "Loaded layout for doctor {}: {} appointments, {} feedback entries",
            doctor_id,
            appointments.len(),
            feedback.len()
        );

        Ok(DoctorLayout {
            profile,
            weekly_schedule: weekly_schedule(&hours, &breaks),
            appointments,
            feedback,
            loaded_at: now,
            appointments_refreshed_at: now,
        })
    }

    pub async fn appointments(&self, doctor_id: &str) -> Result<Vec<Appointment>, DashboardError> {
        Ok(self.appointments.list_for_doctor(doctor_id).await?)
    }
}
