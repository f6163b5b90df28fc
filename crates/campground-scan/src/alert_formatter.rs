use crate::scan_types::VacancyInfo;

/// Render a batch of vacancies as `(email_body, push_body)`.
///
/// The email lists every vacancy; the push message names the first one and
/// summarizes the rest. Callers only format non-empty batches; an empty slice
/// yields two empty strings.
pub fn format_vacancies(vacancies: &[VacancyInfo]) -> (String, String) {
    let Some(first) = vacancies.first() else {
        return (String::new(), String::new());
    };
    let count = vacancies.len();

    let mut lines = vec![format!(
        "{} accommodation{} just opened for your watched dates:\n",
        count,
        if count > 1 { "s" } else { "" }
    )];
    for vacancy in vacancies {
        lines.push(format!("• {} — {}", vacancy.name, vacancy.dates));
        lines.push(format!("  Book now: {}\n", vacancy.url));
    }
    let email_body = lines.join("\n");

    let push_body = if count == 1 {
        format!("{} ({})\n{}", first.name, first.dates, first.url)
    } else {
        format!(
            "{} ({}) + {} more\n{}",
            first.name,
            first.dates,
            count - 1,
            first.url
        )
    };

    (email_body, push_body)
}

/// Email subject for an alert about `park`
pub fn email_subject(park: &str) -> String {
    format!("🏕 Vacancy Alert — {}", park)
}

/// Push notification title for `count` vacancies in `park`
pub fn push_title(park: &str, count: usize) -> String {
    format!(
        "🏕 {} — {} vacanc{} found",
        park,
        count,
        if count > 1 { "ies" } else { "y" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vacancy(name: &str, dates: &str, url: &str) -> VacancyInfo {
        VacancyInfo {
            park: "Yosemite National Park".to_string(),
            name: name.to_string(),
            dates: dates.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_single_vacancy() {
        let (email, push) = format_vacancies(&[vacancy(
            "Curry Village Cabin #4",
            "2025-07-01 to 2025-07-07",
            "https://rec.gov/1",
        )]);

        assert_eq!(
            email,
            "1 accommodation just opened for your watched dates:\n\n\
             • Curry Village Cabin #4 — 2025-07-01 to 2025-07-07\n\
             \x20 Book now: https://rec.gov/1\n"
        );
        assert_eq!(
            push,
            "Curry Village Cabin #4 (2025-07-01 to 2025-07-07)\nhttps://rec.gov/1"
        );
    }

    #[test]
    fn test_multiple_vacancies() {
        let (email, push) = format_vacancies(&[
            vacancy("Site A", "Jul 1-5", "https://rec.gov/a"),
            vacancy("Site B", "Aug 1-5", "https://rec.gov/b"),
            vacancy("Site C", "Sep 1-5", "https://rec.gov/c"),
        ]);

        assert!(email.starts_with("3 accommodations just opened"));
        assert!(email.contains("• Site B — Aug 1-5"));
        assert!(email.contains("  Book now: https://rec.gov/c"));
        assert_eq!(push, "Site A (Jul 1-5) + 2 more\nhttps://rec.gov/a");
    }

    #[test]
    fn test_email_preserves_batch_order() {
        let (email, _) = format_vacancies(&[
            vacancy("Second", "x", "u2"),
            vacancy("First", "y", "u1"),
        ]);

        let second = email.find("Second").unwrap();
        let first = email.find("First").unwrap();
        assert!(second < first);
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(format_vacancies(&[]), (String::new(), String::new()));
    }

    #[test]
    fn test_titles() {
        assert_eq!(email_subject("Zion"), "🏕 Vacancy Alert — Zion");
        assert_eq!(push_title("Zion", 1), "🏕 Zion — 1 vacancy found");
        assert_eq!(push_title("Zion", 3), "🏕 Zion — 3 vacancies found");
    }
}
