//! Which followed users celebrate today or tomorrow.

use chrono::{Datelike, Days, NaiveDate};

use crate::db::models::{Profile, User};

/// Whether someone born on `birthday` celebrates on `day`.
///
/// 29 February birthdays are celebrated on 28 February in non-leap years.
pub fn is_birthday_on(birthday: NaiveDate, day: NaiveDate) -> bool {
    if birthday.month() == day.month() && birthday.day() == day.day() {
        return true;
    }
    let leap_day_birthday = birthday.month() == 2 && birthday.day() == 29;
    let is_leap = NaiveDate::from_ymd_opt(day.year(), 2, 29).is_some();
    leap_day_birthday && !is_leap && day.month() == 2 && day.day() == 28
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BirthdayDigest {
    pub today: Vec<Profile>,
    pub tomorrow: Vec<Profile>,
}

impl BirthdayDigest {
    pub fn build(users: impl IntoIterator<Item = User>, today: NaiveDate) -> Self {
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        let mut digest = Self::default();

        for user in users {
            let is_today = is_birthday_on(user.birthday, today);
            let is_tomorrow = is_birthday_on(user.birthday, tomorrow);
            if is_today {
                digest.today.push(user.profile());
            }
            if is_tomorrow {
                digest.tomorrow.push(user.into());
            }
        }

        digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user(username: &str, birthday: NaiveDate) -> User {
        User::new(
            username.to_string(),
            String::new(),
            "Name".to_string(),
            "Surname".to_string(),
            birthday,
        )
    }

    #[test]
    fn test_month_and_day_match_regardless_of_year() {
        assert!(is_birthday_on(date(1990, 6, 5), date(2024, 6, 5)));
        assert!(!is_birthday_on(date(1990, 6, 5), date(2024, 6, 6)));
        assert!(!is_birthday_on(date(1990, 6, 5), date(2024, 5, 6)));
    }

    #[test]
    fn test_leap_day_birthdays() {
        let leapling = date(2000, 2, 29);
        assert!(is_birthday_on(leapling, date(2024, 2, 29)));
        assert!(!is_birthday_on(leapling, date(2024, 2, 28)));
        assert!(is_birthday_on(leapling, date(2023, 2, 28)));
        assert!(!is_birthday_on(leapling, date(2023, 3, 1)));
    }

    #[test]
    fn test_digest_splits_today_and_tomorrow() {
        let today = date(2024, 12, 31);
        let users = vec![
            user("eve", date(1999, 12, 31)),
            user("new_year", date(1985, 1, 1)),
            user("someone", date(1970, 7, 14)),
        ];

        let digest = BirthdayDigest::build(users, today);
        let names = |v: &[Profile]| v.iter().map(|p| p.username.clone()).collect::<Vec<_>>();
        assert_eq!(names(&digest.today), vec!["eve"]);
        assert_eq!(names(&digest.tomorrow), vec!["new_year"]);
    }

    #[test]
    fn test_leapling_listed_today_in_non_leap_year() {
        let users = vec![user("leap", date(2000, 2, 29))];
        let digest = BirthdayDigest::build(users, date(2023, 2, 27));
        assert!(digest.today.is_empty());
        assert_eq!(digest.tomorrow.len(), 1);
    }
}
