//! Populations bound to a shared problem.

use super::individual::Individual;
use crate::error::{Error, Result};
use crate::problem::Problem;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// An ordered collection of individuals bound to one problem.
///
/// Every member has the problem's dimension and lies within its bounds.
/// Cloning copies the individuals and shares the problem.
#[derive(Clone)]
pub struct Population {
    problem: Arc<dyn Problem>,
    individuals: Vec<Individual>,
}

impl fmt::Debug for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Population")
            .field("dimension", &self.problem.dimension())
            .field("individuals", &self.individuals)
            .finish()
    }
}

impl Population {
    /// An empty population.
    pub fn new(problem: Arc<dyn Problem>) -> Self {
        Self {
            problem,
            individuals: Vec::new(),
        }
    }

    /// `size` individuals sampled uniformly within the bounds.
    ///
    /// Decision vectors are drawn sequentially from `rng`; with the
    /// `parallel` feature they are then evaluated on the rayon pool.
    pub fn random<R: Rng>(problem: Arc<dyn Problem>, size: usize, rng: &mut R) -> Result<Self> {
        let xs: Vec<Vec<f64>> = (0..size).map(|_| problem.bounds().sample(rng)).collect();

        #[cfg(feature = "parallel")]
        let individuals = xs
            .into_par_iter()
            .map(|x| Individual::evaluate(problem.as_ref(), x))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let individuals = xs
            .into_iter()
            .map(|x| Individual::evaluate(problem.as_ref(), x))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            problem,
            individuals,
        })
    }

    pub fn problem(&self) -> &Arc<dyn Problem> {
        &self.problem
    }

    pub fn dimension(&self) -> usize {
        self.problem.dimension()
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Individual> {
        self.individuals.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual> {
        self.individuals.iter()
    }

    /// Evaluates `x` and appends it.
    pub fn push(&mut self, x: Vec<f64>) -> Result<()> {
        let ind = Individual::evaluate(self.problem.as_ref(), x)?;
        self.individuals.push(ind);
        Ok(())
    }

    /// Appends an already evaluated individual.
    pub fn push_individual(&mut self, individual: Individual) -> Result<()> {
        self.check_member(&individual)?;
        self.individuals.push(individual);
        Ok(())
    }

    /// Evaluates `x` and stores it at `index`.
    pub fn replace(&mut self, index: usize, x: Vec<f64>) -> Result<()> {
        let ind = Individual::evaluate(self.problem.as_ref(), x)?;
        self.replace_individual(index, ind)
    }

    /// Stores an evaluated individual at `index`.
    pub fn replace_individual(&mut self, index: usize, individual: Individual) -> Result<()> {
        self.check_member(&individual)?;
        let len = self.individuals.len();
        let slot = self.individuals.get_mut(index).ok_or_else(|| {
            Error::InvalidPopulation(format!("index {index} out of range for size {len}"))
        })?;
        *slot = individual;
        Ok(())
    }

    /// Overwrites the worst member with `individual`.
    pub fn replace_worst(&mut self, individual: Individual) -> Result<()> {
        let worst = self
            .worst_index()
            .ok_or_else(|| Error::InvalidPopulation("population is empty".into()))?;
        self.replace_individual(worst, individual)
    }

    pub fn best_index(&self) -> Option<usize> {
        self.individuals
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.compare(b))
            .map(|(i, _)| i)
    }

    pub fn worst_index(&self) -> Option<usize> {
        self.individuals
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.compare(b))
            .map(|(i, _)| i)
    }

    pub fn best(&self) -> Option<&Individual> {
        self.best_index().map(|i| &self.individuals[i])
    }

    pub fn worst(&self) -> Option<&Individual> {
        self.worst_index().map(|i| &self.individuals[i])
    }

    fn check_member(&self, individual: &Individual) -> Result<()> {
        let p = self.problem.as_ref();
        if individual.x().len() != p.dimension()
            || individual.fitness().len() != p.objective_count()
            || individual.constraints().len() != p.constraint_count()
        {
            return Err(Error::InvalidPopulation(format!(
                "individual shape ({}, {}, {}) does not match problem ({}, {}, {})",
                individual.x().len(),
                individual.fitness().len(),
                individual.constraints().len(),
                p.dimension(),
                p.objective_count(),
                p.constraint_count()
            )));
        }
        if !p.bounds().contains(individual.x()) {
            return Err(Error::InvalidPopulation(
                "individual lies outside the problem bounds".into(),
            ));
        }
        if !individual.evaluated_on(p) {
            return Err(Error::InvalidPopulation(
                "individual was evaluated on a different problem".into(),
            ));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Individual;
    type IntoIter = std::slice::Iter<'a, Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Bounds, FnProblem};
    use crate::random::create_rng;

    fn sphere(dim: usize) -> Arc<dyn Problem> {
        Arc::new(FnProblem::new(Bounds::uniform(dim, -5.0, 5.0).unwrap(), |x| {
            Ok(x.iter().map(|v| v * v).sum())
        }))
    }

    #[test]
    fn test_random_population_in_bounds() {
        let mut rng = create_rng(Some(42));
        let pop = Population::random(sphere(4), 25, &mut rng).unwrap();
        assert_eq!(pop.len(), 25);
        for ind in &pop {
            assert!(pop.problem().bounds().contains(ind.x()));
        }
    }

    #[test]
    fn test_best_and_worst() {
        let mut pop = Population::new(sphere(2));
        pop.push(vec![1.0, 1.0]).unwrap();
        pop.push(vec![0.0, 0.5]).unwrap();
        pop.push(vec![3.0, -4.0]).unwrap();
        assert_eq!(pop.best_index(), Some(1));
        assert_eq!(pop.worst_index(), Some(2));
        assert_eq!(pop.best().unwrap().fitness(), &[0.25]);
    }

    #[test]
    fn test_empty_population_has_no_best() {
        let pop = Population::new(sphere(2));
        assert!(pop.is_empty());
        assert!(pop.best().is_none());
        assert!(pop.worst_index().is_none());
    }

    #[test]
    fn test_push_rejects_bad_vectors() {
        let mut pop = Population::new(sphere(2));
        assert!(pop.push(vec![1.0]).unwrap_err().is_invalid_population());
        assert!(pop.push(vec![1.0, 9.0]).unwrap_err().is_invalid_population());
        assert!(pop.is_empty());
    }

    #[test]
    fn test_replace_worst_and_foreign_individual() {
        let mut pop = Population::new(sphere(2));
        pop.push(vec![1.0, 1.0]).unwrap();
        pop.push(vec![4.0, 4.0]).unwrap();

        let other = sphere(3);
        let alien = Individual::evaluate(other.as_ref(), vec![0.0; 3]).unwrap();
        assert!(pop.replace_worst(alien).is_err());

        let good = Individual::evaluate(pop.problem().as_ref(), vec![0.0, 0.0]).unwrap();
        pop.replace_worst(good).unwrap();
        assert_eq!(pop.get(1).unwrap().fitness(), &[0.0]);
        assert!(pop.replace(5, vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn test_rejects_individual_from_same_shape_problem() {
        let mut pop = Population::new(sphere(2));
        pop.push(vec![1.0, 1.0]).unwrap();
        pop.push(vec![4.0, 4.0]).unwrap();

        let rigged: Arc<dyn Problem> =
            Arc::new(FnProblem::new(Bounds::uniform(2, -5.0, 5.0).unwrap(), |_| Ok(-1000.0)));
        let alien = Individual::evaluate(rigged.as_ref(), vec![4.0, 4.0]).unwrap();
        assert_eq!(alien.fitness(), &[-1000.0]);

        let err = pop.replace_worst(alien.clone()).unwrap_err();
        assert!(err.is_invalid_population());
        assert!(pop.replace_individual(0, alien.clone()).is_err());
        assert!(pop.push_individual(alien).is_err());

        assert_eq!(pop.len(), 2);
        assert_eq!(pop.best().unwrap().fitness(), &[2.0]);
        assert_eq!(pop.worst().unwrap().fitness(), &[32.0]);

        let copy = pop.clone();
        let shared = Individual::evaluate(copy.problem().as_ref(), vec![0.0, 1.0]).unwrap();
        pop.replace_worst(shared).unwrap();
        assert_eq!(pop.best().unwrap().fitness(), &[1.0]);
    }
}
