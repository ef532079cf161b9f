#[cfg(test)]
mod tests {
    use crate::chance::{RollResults, Roller};
    use crate::dice::DiceSet;

    #[test]
    fn seeded_roller_is_deterministic() {
        let sel = [false, true, false, false, true];
        let a = Roller::seeded(123).roll_intent(sel, 1000, 1);
        let b = Roller::seeded(123).roll_intent(sel, 1000, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn clone_replays_the_same_faces() {
        let mut a = Roller::seeded(5);
        a.face();
        let mut b = a.clone();
        let fa: Vec<u8> = (0..32).map(|_| a.face()).collect();
        let fb: Vec<u8> = (0..32).map(|_| b.face()).collect();
        assert_eq!(fa, fb);

        let mut c = Roller::seeded(6);
        let fc: Vec<u8> = (0..32).map(|_| c.face()).collect();
        assert_ne!(fa, fc);
    }

    #[test]
    fn held_dice_get_the_unchanged_sentinel() {
        let mut r = Roller::seeded(7);
        let sel = [true, false, true, false, false];
        let res = r.draw(&sel);
        assert!(res.matches_selection(&sel));
        assert_eq!(res.rolled_count(), 3);
        assert!(res.is_valid());
        assert_eq!(res.0[0], None);
        assert_eq!(res.0[2], None);
    }

    #[test]
    fn faces_are_roughly_uniform() {
        let mut r = Roller::seeded(2024);
        let mut counts = [0u32; 6];
        let n = 60_000u32;
        for _ in 0..n {
            counts[(r.face() - 1) as usize] += 1;
        }
        let expected = n / 6;
        for (i, &c) in counts.iter().enumerate() {
            let dev = (c as i64 - expected as i64).unsigned_abs();
            assert!(dev < (expected / 20) as u64, "face {} count {} too far from {}", i + 1, c, expected);
        }
    }

    #[test]
    fn held_index_is_never_changed_by_results() {
        let mut dice = DiceSet::canonical();
        dice.faces = [6, 5, 4, 3, 2];
        let results = RollResults([Some(1), None, Some(1), None, Some(1)]);
        dice.apply_results(&results);
        assert_eq!(dice.faces, [1, 5, 1, 3, 1]);
    }

    #[test]
    fn identical_results_give_identical_faces_on_both_sides() {
        let mut r = Roller::seeded(99);
        let sel = [false, false, true, false, true];
        let intent = r.roll_intent(sel, 4500, 2);

        let mut acting = DiceSet {
            faces: [2, 2, 6, 2, 3],
            held: sel,
        };
        let mut mirror = acting;
        acting.apply_results(&intent.results);
        mirror.apply_results(&intent.results);
        assert_eq!(acting.faces, mirror.faces);
        assert_eq!(acting.faces[2], 6);
        assert_eq!(acting.faces[4], 3);
    }
}
