#[cfg(test)]
mod tests {
    use crate::{score, scores_for_dice, CardError, Category, ScoreCard, UPPER_BONUS};

    fn all_hands() -> impl Iterator<Item = [u8; 5]> {
        (0..6u32.pow(5)).map(|mut n| {
            let mut d = [0u8; 5];
            for slot in &mut d {
                *slot = (n % 6) as u8 + 1;
                n /= 6;
            }
            d
        })
    }

    #[test]
    fn scoring_is_order_independent_exhaustive_5dice() {
        // Every hand vs. its sorted and reversed permutations (6^5 = 7776 hands).
        for dice in all_hands() {
            let base = scores_for_dice(dice);
            let mut sorted = dice;
            sorted.sort_unstable();
            let mut rev = sorted;
            rev.reverse();
            let rotated = [dice[2], dice[4], dice[0], dice[3], dice[1]];
            assert_eq!(base, scores_for_dice(sorted), "sorted mismatch for {:?}", dice);
            assert_eq!(base, scores_for_dice(rev), "reversed mismatch for {:?}", dice);
            assert_eq!(base, scores_for_dice(rotated), "rotated mismatch for {:?}", dice);
            assert_eq!(base, scores_for_dice(dice));
        }
    }

    #[test]
    fn five_of_a_kind() {
        let d = [3, 3, 3, 3, 3];
        assert_eq!(score(Category::FourOfKind, d), 15);
        assert_eq!(score(Category::Yahtzee, d), 50);
        assert_eq!(score(Category::FullHouse, d), 0);
        assert_eq!(score(Category::Threes, d), 15);
        assert_eq!(score(Category::Chance, d), 15);
    }

    #[test]
    fn two_pair_is_not_a_full_house() {
        // Two pairs with a single: no triple.
        let d = [2, 2, 3, 4, 4];
        assert_eq!(score(Category::FullHouse, d), 0);
        assert_eq!(score(Category::FourOfKind, d), 0);
        assert_eq!(score(Category::Chance, d), 15);
    }

    #[test]
    fn full_house_sums_all_dice() {
        let d = [2, 2, 4, 4, 4];
        assert_eq!(score(Category::FullHouse, d), 16);
        assert_eq!(score(Category::FourOfKind, d), 0);
        assert_eq!(score(Category::Yahtzee, d), 0);
    }

    #[test]
    fn straights() {
        let low = [1, 2, 3, 4, 5];
        assert_eq!(score(Category::SmallStraight, low), 15);
        assert_eq!(score(Category::LargeStraight, low), 30);

        let high = [6, 2, 5, 3, 4];
        assert_eq!(score(Category::SmallStraight, high), 15);
        assert_eq!(score(Category::LargeStraight, high), 30);

        let gap = [1, 2, 3, 4, 6];
        assert_eq!(score(Category::SmallStraight, gap), 15);
        assert_eq!(score(Category::LargeStraight, gap), 0);

        let broken = [1, 2, 3, 5, 6];
        assert_eq!(score(Category::SmallStraight, broken), 0);
        assert_eq!(score(Category::LargeStraight, broken), 0);

        // Duplicate inside the run still counts as a small straight.
        let dup = [3, 4, 4, 5, 6];
        assert_eq!(score(Category::SmallStraight, dup), 15);
        assert_eq!(score(Category::LargeStraight, dup), 0);
    }

    #[test]
    fn one_two_three_four_six_has_small_straight_only() {
        // {1,2,3,4} is present, so the small straight holds even with the 6.
        let d = [1, 2, 3, 4, 6];
        assert_eq!(score(Category::SmallStraight, d), 15);
        assert_eq!(score(Category::LargeStraight, d), 0);
    }

    #[test]
    fn four_of_a_kind_sums_all_dice() {
        let d = [5, 5, 5, 5, 2];
        assert_eq!(score(Category::FourOfKind, d), 22);
        assert_eq!(score(Category::Fives, d), 20);
        assert_eq!(score(Category::Twos, d), 2);
        assert_eq!(score(Category::Ones, d), 0);
    }

    #[test]
    fn category_names_round_trip_through_from_str() {
        for c in Category::ALL {
            assert_eq!(c.name().parse::<Category>().unwrap(), c);
        }
        assert!("bogus".parse::<Category>().is_err());
    }

    #[test]
    fn committed_category_cannot_be_rescored() {
        let mut card = ScoreCard::new();
        card.commit(Category::Chance, 20).unwrap();
        let err = card.commit(Category::Chance, 29).unwrap_err();
        assert_eq!(
            err,
            CardError::AlreadyScored {
                category: Category::Chance,
                existing: 20
            }
        );
        assert_eq!(card.get(Category::Chance), Some(20));
    }

    #[test]
    fn bonus_applies_exactly_at_63() {
        let mut card = ScoreCard::new();
        // 3 of each face in the upper section: 3+6+9+12+15+18 = 63.
        for (i, c) in Category::UPPER.iter().enumerate() {
            card.commit(*c, 3 * (i as u32 + 1)).unwrap();
        }
        assert_eq!(card.upper_subtotal(), 63);
        assert_eq!(card.bonus(), UPPER_BONUS);
        assert_eq!(card.total(), 63 + 35);
        // Idempotent read.
        assert_eq!(card.total(), card.total());

        let mut short = ScoreCard::new();
        for (i, c) in Category::UPPER.iter().enumerate() {
            let v = 3 * (i as u32 + 1);
            short.commit(*c, if *c == Category::Ones { v - 1 } else { v }).unwrap();
        }
        assert_eq!(short.upper_subtotal(), 62);
        assert_eq!(short.bonus(), 0);
        assert_eq!(short.total(), 62);
    }

    #[test]
    fn lower_section_never_counts_toward_bonus() {
        let mut card = ScoreCard::new();
        card.commit(Category::Yahtzee, 50).unwrap();
        card.commit(Category::Chance, 30).unwrap();
        assert_eq!(card.upper_subtotal(), 0);
        assert_eq!(card.bonus(), 0);
        assert_eq!(card.total(), 80);
    }
}
