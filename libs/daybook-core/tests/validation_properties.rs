use daybook_core::{validate_description, validate_title, DescriptionError, TitleError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_blank_titles_are_empty(title in "[ \t\n]{0,120}") {
        prop_assert_eq!(validate_title(&title), Some(TitleError::Empty));
    }

    #[test]
    fn prop_title_length_limit(title in "[a-zA-Zéü0-9][a-zA-Zéü0-9 ]{0,140}") {
        let expected = if title.chars().count() > 100 {
            Some(TitleError::TooLong)
        } else {
            None
        };
        prop_assert_eq!(validate_title(&title), expected);
    }

    #[test]
    fn prop_description_length_limit(length in 0_usize..2_500) {
        let description = "ä".repeat(length);
        let expected = (length > 2000).then_some(DescriptionError::TooLong);
        prop_assert_eq!(validate_description(&description), expected);
    }
}
