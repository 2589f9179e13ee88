use chrono::{Duration, NaiveDateTime};

use super::domain::{AdminPermission, Announcement, Notification, Poll, PollOption};
use super::state::{record_id, SchoolError, SchoolState};

/// Polls and announcements without an explicit expiry stay up this long.
pub const DEFAULT_POST_LIFETIME_DAYS: i64 = 7;

impl SchoolState {
    pub fn create_poll(
        &mut self,
        admin_id: &str,
        question: &str,
        options: &[String],
        expires_at: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<&Poll, SchoolError> {
        self.authorized(admin_id, AdminPermission::PollsAnnouncements)?;
        let question = question.trim();
        if question.is_empty()
            || options.len() < 2
            || options.iter().any(|option| option.trim().is_empty())
        {
            return Err(SchoolError::InvalidPoll);
        }

        self.polls.push(Poll {
            id: record_id("poll"),
            question: question.to_string(),
            options: options
                .iter()
                .enumerate()
                .map(|(index, text)| PollOption {
                    id: format!("opt-{index}"),
                    text: text.trim().to_string(),
                    votes: Vec::new(),
                })
                .collect(),
            created_at: now,
            expires_at: expires_at.unwrap_or(now + Duration::days(DEFAULT_POST_LIFETIME_DAYS)),
            active: true,
            created_by: admin_id.to_string(),
        });
        self.polls.last().ok_or(SchoolError::PollNotFound)
    }

    /// One vote per student per poll, across all options.
    pub fn vote(
        &mut self,
        student_id: &str,
        poll_id: &str,
        option_id: &str,
        now: NaiveDateTime,
    ) -> Result<&Poll, SchoolError> {
        self.student(student_id)?;
        let poll = self
            .polls
            .iter_mut()
            .find(|poll| poll.id == poll_id)
            .ok_or(SchoolError::PollNotFound)?;
        if !poll.is_open(now) {
            return Err(SchoolError::PollClosed);
        }
        if poll.has_voted(student_id) {
            return Err(SchoolError::AlreadyVoted);
        }

        let option = poll
            .options
            .iter_mut()
            .find(|option| option.id == option_id)
            .ok_or(SchoolError::PollOptionNotFound)?;
        option.votes.push(student_id.to_string());
        Ok(poll)
    }

    pub fn active_polls(&self, now: NaiveDateTime) -> Vec<&Poll> {
        self.polls.iter().filter(|poll| poll.is_open(now)).collect()
    }

    pub fn delete_poll(&mut self, admin_id: &str, poll_id: &str) -> Result<(), SchoolError> {
        self.authorized(admin_id, AdminPermission::PollsAnnouncements)?;
        let index = self
            .polls
            .iter()
            .position(|poll| poll.id == poll_id)
            .ok_or(SchoolError::PollNotFound)?;
        self.polls.remove(index);
        Ok(())
    }

    pub fn post_announcement(
        &mut self,
        admin_id: &str,
        title: &str,
        content: &str,
        expires_at: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<&Announcement, SchoolError> {
        self.authorized(admin_id, AdminPermission::PollsAnnouncements)?;
        let (title, content) = (title.trim(), content.trim());
        if title.is_empty() || content.is_empty() {
            return Err(SchoolError::InvalidAnnouncement);
        }

        self.announcements.push(Announcement {
            id: record_id("ann"),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            expires_at: expires_at.unwrap_or(now + Duration::days(DEFAULT_POST_LIFETIME_DAYS)),
            active: true,
            created_by: admin_id.to_string(),
        });
        self.announcements
            .last()
            .ok_or(SchoolError::AnnouncementNotFound)
    }

    pub fn active_announcements(&self, now: NaiveDateTime) -> Vec<&Announcement> {
        self.announcements
            .iter()
            .filter(|announcement| announcement.is_visible(now))
            .collect()
    }

    pub fn delete_announcement(
        &mut self,
        admin_id: &str,
        announcement_id: &str,
    ) -> Result<(), SchoolError> {
        self.authorized(admin_id, AdminPermission::PollsAnnouncements)?;
        let index = self
            .announcements
            .iter()
            .position(|announcement| announcement.id == announcement_id)
            .ok_or(SchoolError::AnnouncementNotFound)?;
        self.announcements.remove(index);
        Ok(())
    }

    /// Newest first.
    pub fn notifications(&self, student_id: &str) -> Result<&[Notification], SchoolError> {
        Ok(&self.student(student_id)?.notifications)
    }

    /// Returns how many notifications were unread.
    pub fn mark_notifications_read(&mut self, student_id: &str) -> Result<usize, SchoolError> {
        let student = self.student_mut(student_id)?;
        let unread = student.unread_notifications();
        for notification in &mut student.notifications {
            notification.read = true;
        }
        Ok(unread)
    }
}
