use chrono::NaiveDate;
use pilot_core::error::ValidationErrors;
use pilot_models::{Program, Site, Submission};

use crate::base::{validate_logged_in, Contract, UserContext, ValidationResult};
use crate::permissions;

pub const MIN_TEMPERATURE_F: f64 = -80.0;
pub const MAX_TEMPERATURE_F: f64 = 160.0;

/// Validates the submission created when a field worker opens a session
pub struct OpenSessionContract<'a, U: UserContext> {
    user: &'a U,
    program: &'a Program,
    site: &'a Site,
    today: NaiveDate,
}

impl<'a, U: UserContext> OpenSessionContract<'a, U> {
    pub fn new(user: &'a U, program: &'a Program, site: &'a Site, today: NaiveDate) -> Self {
        Self {
            user,
            program,
            site,
            today,
        }
    }

    fn validate_user_allowed(&self, errors: &mut ValidationErrors) {
        validate_logged_in(self.user, errors);
        if self.user.is_anonymous() {
            return;
        }

        if !self
            .user
            .allowed_in_program(permissions::SUBMIT_DATA, self.site.program_id)
        {
            errors.add_base("You are not authorized to submit data in this program");
        }
    }

    fn validate_program_running(&self, errors: &mut ValidationErrors) {
        if !self.program.is_active() {
            errors.add_base("Program is not active");
        } else if !self.program.date_range().contains(self.today) {
            errors.add_base(format!(
                "Program runs from {} to {}",
                self.program.start_date, self.program.end_date
            ));
        }
    }

    fn validate_readings(&self, submission: &Submission, errors: &mut ValidationErrors) {
        if !submission.temperature.is_finite()
            || !(MIN_TEMPERATURE_F..=MAX_TEMPERATURE_F).contains(&submission.temperature)
        {
            errors.add(
                "temperature",
                format!("must be between {MIN_TEMPERATURE_F} and {MAX_TEMPERATURE_F}"),
            );
        }
        if !submission.humidity.is_finite() || !(0.0..=100.0).contains(&submission.humidity) {
            errors.add("humidity", "must be between 0 and 100");
        }
    }
}

impl<'a, U: UserContext> Contract<Submission> for OpenSessionContract<'a, U> {
    fn validate(&self, submission: &Submission) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_user_allowed(&mut errors);
        self.validate_program_running(&mut errors);

        if Some(submission.site_id) != self.site.id || submission.program_id != self.site.program_id
        {
            errors.add("site_id", "does not belong to the program");
        }

        self.validate_readings(submission, &mut errors);

        errors.into_result()
    }
}
