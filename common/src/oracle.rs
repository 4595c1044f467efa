//! Exact deductions for a set of sentences, via a SAT solver.
//!
//! The knowledge base's rules are sound but incomplete: some forced cells
//! need reasoning over several overlapping sentences at once. The oracle
//! answers those exactly, which makes it useful to audit the knowledge base
//! and to measure what it misses.

use std::collections::HashMap;

use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::{Cell, KnowledgeBase, Sentence};

/// The possible outcomes of the oracle's analysis for a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    ForcedMine,   // Every assignment satisfying the sentences makes this a mine.
    ForcedSafe,   // Every assignment satisfying the sentences keeps this clear.
    Undetermined, // Both are possible.
}

/// Deductions for every cell mentioned by at least one sentence.
pub type Analysis = HashMap<Cell, DeducedState>;

/// Classifies every cell mentioned in `sentences`.
///
/// Fails with `unsatisfiable` when no mine layout satisfies all sentences.
pub fn analyze(sentences: &[Sentence]) -> anyhow::Result<Analysis> {
    let mut solver = Solver::new();
    let mut var_map: HashMap<Cell, Var> = HashMap::new();

    for cell in sentences.iter().flat_map(Sentence::cells) {
        var_map.entry(*cell).or_insert_with(|| solver.new_var());
    }

    let mut formula = CnfFormula::new();
    for sentence in sentences {
        let lits: Vec<Lit> = sentence
            .cells()
            .iter()
            .map(|cell| Lit::from_var(var_map[cell], true))
            .collect();
        encode_exactly(&mut formula, &lits, sentence.count());
    }
    solver.add_formula(&formula);

    if !solver.solve()? {
        anyhow::bail!("unsatisfiable");
    }

    let mut deductions = Analysis::new();
    for (&cell, &var) in &var_map {
        let mine_possible = solve_assuming(&mut solver, Lit::from_var(var, true))?;
        let safe_possible = solve_assuming(&mut solver, Lit::from_var(var, false))?;

        let state = match (mine_possible, safe_possible) {
            (true, true) => DeducedState::Undetermined,
            (true, false) => DeducedState::ForcedMine,
            (false, true) => DeducedState::ForcedSafe,
            (false, false) => anyhow::bail!("state_collision at {cell}"),
        };
        deductions.insert(cell, state);
    }

    Ok(deductions)
}

/// Cells the oracle can resolve from `sentences` that `kb` has not resolved.
///
/// Returns an error if the knowledge base claims something the oracle refutes.
pub fn missed_deductions(
    kb: &KnowledgeBase,
    sentences: &[Sentence],
) -> anyhow::Result<Vec<(Cell, DeducedState)>> {
    let analysis = analyze(sentences)?;
    let mut missed = Vec::new();

    for (&cell, &state) in analysis.iter().sorted_by_key(|(cell, _)| **cell) {
        let claimed_mine = kb.mines().contains(&cell);
        let claimed_safe = kb.safes().contains(&cell);
        match state {
            DeducedState::ForcedMine if claimed_safe => {
                anyhow::bail!("{cell} was marked safe but must be a mine")
            }
            DeducedState::ForcedSafe if claimed_mine => {
                anyhow::bail!("{cell} was marked as a mine but must be safe")
            }
            DeducedState::Undetermined if claimed_mine || claimed_safe => {
                anyhow::bail!("{cell} was resolved but is not forced either way")
            }
            DeducedState::ForcedMine | DeducedState::ForcedSafe
                if !claimed_mine && !claimed_safe =>
            {
                missed.push((cell, state));
            }
            _ => {}
        }
    }

    Ok(missed)
}

fn solve_assuming(solver: &mut Solver, lit: Lit) -> anyhow::Result<bool> {
    solver.assume(&[lit]);
    let result = solver.solve();
    solver.assume(&[]);
    Ok(result?)
}

/// Encodes "exactly k of `lits` are true".
///
/// Sentences never span more than a cell's eight neighbors, so the naive
/// binomial encoding stays small.
fn encode_exactly(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    // At most k: every k + 1 subset has a false literal.
    if k < lits.len() {
        for combo in lits.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
    }
    // At least k: every n - k + 1 subset has a true literal.
    if k > 0 {
        for combo in lits.iter().copied().combinations(lits.len() - k + 1) {
            formula.add_clause(&combo);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, GameState};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn c(row: usize, col: usize) -> Cell {
        Cell::new(row, col)
    }

    fn sentence(cells: &[(usize, usize)], count: usize) -> Sentence {
        Sentence::new(cells.iter().map(|&p| Cell::from(p)), count).unwrap()
    }

    #[test]
    fn test_symmetric_sentence_is_undetermined() {
        let analysis = analyze(&[sentence(&[(0, 0), (0, 1)], 1)]).unwrap();
        assert_eq!(analysis[&c(0, 0)], DeducedState::Undetermined);
        assert_eq!(analysis[&c(0, 1)], DeducedState::Undetermined);
    }

    #[test]
    fn test_subset_deduction() {
        let analysis = analyze(&[
            sentence(&[(0, 0), (0, 1), (0, 2)], 1),
            sentence(&[(0, 0), (0, 1)], 1),
        ])
        .unwrap();
        assert_eq!(analysis[&c(0, 2)], DeducedState::ForcedSafe);
        assert_eq!(analysis[&c(0, 0)], DeducedState::Undetermined);
    }

    #[test]
    fn test_unsatisfiable() {
        let result = analyze(&[
            sentence(&[(0, 0), (0, 1)], 2),
            sentence(&[(0, 0), (0, 1), (0, 2)], 0),
        ]);
        assert!(result.is_err());
    }

    /// A 1-2-1 row over five hidden cells: every cell is forced, but no
    /// sentence is a subset of another, so the knowledge base learns nothing.
    #[test]
    fn test_oracle_finds_what_subsets_miss() {
        let sentences = vec![
            sentence(&[(0, 0), (0, 1), (0, 2)], 1),
            sentence(&[(0, 1), (0, 2), (0, 3)], 2),
            sentence(&[(0, 2), (0, 3), (0, 4)], 1),
        ];
        let analysis = analyze(&sentences).unwrap();
        assert_eq!(analysis[&c(0, 0)], DeducedState::ForcedSafe);
        assert_eq!(analysis[&c(0, 1)], DeducedState::ForcedMine);
        assert_eq!(analysis[&c(0, 2)], DeducedState::ForcedSafe);
        assert_eq!(analysis[&c(0, 3)], DeducedState::ForcedMine);
        assert_eq!(analysis[&c(0, 4)], DeducedState::ForcedSafe);

        let mut kb = KnowledgeBase::new(2, 5);
        for s in &sentences {
            kb.add_sentence(s.clone()).unwrap();
        }
        assert_eq!(kb.settle().unwrap(), 0);
        assert_eq!(missed_deductions(&kb, &sentences).unwrap().len(), 5);
    }

    #[test]
    fn test_missed_deductions_empty_after_settle() {
        let mut kb = KnowledgeBase::new(1, 3);
        let sentences = vec![
            sentence(&[(0, 0), (0, 1), (0, 2)], 1),
            sentence(&[(0, 0), (0, 1)], 1),
        ];
        for s in &sentences {
            kb.add_sentence(s.clone()).unwrap();
        }

        let before = missed_deductions(&kb, &sentences).unwrap();
        assert_eq!(before, vec![(c(0, 2), DeducedState::ForcedSafe)]);

        kb.settle().unwrap();
        assert!(missed_deductions(&kb, &sentences).unwrap().is_empty());
    }

    #[test]
    fn test_missed_deductions_rejects_wrong_claim() {
        let mut kb = KnowledgeBase::new(1, 2);
        kb.mark_safe(c(0, 0)).unwrap();
        let result = missed_deductions(&kb, &[sentence(&[(0, 0), (0, 1)], 2)]);
        assert!(result.is_err());
    }

    /// Every cell the knowledge base resolves during real play is forced the
    /// same way when the visible board is handed to the oracle.
    #[test]
    fn test_knowledge_base_agrees_with_oracle() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..15 {
            let mut game = Game::random(6, 6, 6, &mut rng).unwrap();
            while game.state() == GameState::Playing {
                if game.ai_step(&mut rng).unwrap().is_none() || game.state() == GameState::Lost {
                    break;
                }
                let constraints = game.build_constraints().unwrap();
                if constraints.is_empty() {
                    continue;
                }
                missed_deductions(game.knowledge(), &constraints).unwrap();
            }
        }
    }
}
