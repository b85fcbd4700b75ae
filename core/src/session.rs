use serde::Serialize;
use uuid::Uuid;

/// State carried across one interactive session: who is selected and the
/// recommendations produced for them so far.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub id: String,
    pub selected_user: Option<String>,
    pub last_workout: Option<String>,
    pub last_dinner: Option<String>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            selected_user: None,
            last_workout: None,
            last_dinner: None,
        }
    }

    /// Switch the selected user. Recommendations made for someone else are
    /// dropped.
    pub fn select_user(&mut self, name: &str) {
        if self.selected_user.as_deref() != Some(name) {
            self.last_workout = None;
            self.last_dinner = None;
        }
        self.selected_user = Some(name.to_string());
    }

    /// Follow a profile rename without losing pending recommendations.
    pub fn rename_user(&mut self, old: &str, new: &str) {
        if self.selected_user.as_deref() == Some(old) {
            self.selected_user = Some(new.to_string());
        }
    }

    pub fn set_workout(&mut self, text: String) {
        self.last_workout = Some(text);
    }

    pub fn set_dinner(&mut self, text: String) {
        self.last_dinner = Some(text);
    }

    /// The workout and dinner pair ready to be saved, if both exist.
    #[must_use]
    pub fn pending_history(&self) -> Option<(&str, &str)> {
        Some((self.last_workout.as_deref()?, self.last_dinner.as_deref()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sessions_have_unique_ids() {
        assert_ne!(SessionContext::new().id, SessionContext::new().id);
    }

    #[test]
    fn test_pending_history_needs_both() {
        let mut s = SessionContext::new();
        s.select_user("User B");
        assert!(s.pending_history().is_none());
        s.set_workout("Circuit".to_string());
        assert!(s.pending_history().is_none());
        s.set_dinner("Tacos".to_string());
        assert_eq!(s.pending_history(), Some(("Circuit", "Tacos")));
    }

    #[test]
    fn test_select_other_user_clears_recommendations() {
        let mut s = SessionContext::new();
        s.select_user("User B");
        s.set_workout("Circuit".to_string());
        s.set_dinner("Tacos".to_string());

        s.select_user("User B");
        assert!(s.pending_history().is_some());

        s.select_user("User C");
        assert_eq!(s.selected_user.as_deref(), Some("User C"));
        assert!(s.last_workout.is_none());
        assert!(s.last_dinner.is_none());
    }

    #[test]
    fn test_rename_keeps_recommendations() {
        let mut s = SessionContext::new();
        s.select_user("User B");
        s.set_workout("Circuit".to_string());
        s.rename_user("User B", "Alex");
        assert_eq!(s.selected_user.as_deref(), Some("Alex"));
        assert_eq!(s.last_workout.as_deref(), Some("Circuit"));

        s.rename_user("Someone", "Else");
        assert_eq!(s.selected_user.as_deref(), Some("Alex"));
    }
}
