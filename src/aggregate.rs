use crate::model::{AuthorContribution, AuthorGroup, ContributionTriple, RepositoryContribution, TOTAL_ROW};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateState {
    pub per_repository: Vec<RepositoryContribution>,
    pub totals: Vec<AuthorContribution>,
}

impl AggregateState {
    pub fn repository(&self, name: &str) -> Option<&RepositoryContribution> {
        self.per_repository.iter().find(|r| r.repository == name)
    }

    pub fn total(&self, author: &str) -> Option<&ContributionTriple> {
        self.totals
            .iter()
            .find(|a| a.author == author)
            .map(|a| &a.stats)
    }
}

#[derive(Debug, Default)]
pub struct Aggregator {
    authors: Vec<String>,
    per_repository: HashMap<String, HashMap<String, ContributionTriple>>,
    totals: HashMap<String, ContributionTriple>,
}

impl Aggregator {
    pub fn seed(groups: &[AuthorGroup]) -> Self {
        let mut aggregator = Self::default();
        for group in groups {
            if aggregator
                .totals
                .insert(group.display_name.clone(), ContributionTriple::default())
                .is_none()
            {
                aggregator.authors.push(group.display_name.clone());
            }
        }
        aggregator
    }

    pub fn record_pair(&mut self, repository: &str, author: &str, triple: ContributionTriple) {
        self.per_repository
            .entry(repository.to_string())
            .or_default()
            .insert(author.to_string(), triple);

        if !self.totals.contains_key(author) {
            self.authors.push(author.to_string());
        }
        *self.totals.entry(author.to_string()).or_default() += triple;
    }

    /// Orders rows by `repository_order` and authors by seeding order, appending
    /// the `[total]` row when more than one repository took part.
    pub fn finalize(mut self, repository_order: &[String]) -> AggregateState {
        let totals: Vec<AuthorContribution> = self
            .authors
            .iter()
            .map(|author| AuthorContribution {
                author: author.clone(),
                stats: self.totals.get(author).copied().unwrap_or_default(),
            })
            .collect();

        let mut per_repository: Vec<RepositoryContribution> = repository_order
            .iter()
            .map(|repository| {
                let mut computed = self.per_repository.remove(repository).unwrap_or_default();
                let authors = self
                    .authors
                    .iter()
                    .filter_map(|author| {
                        computed.remove(author).map(|stats| AuthorContribution {
                            author: author.clone(),
                            stats,
                        })
                    })
                    .collect();
                RepositoryContribution {
                    repository: repository.clone(),
                    authors,
                }
            })
            .collect();

        if repository_order.len() > 1 {
            per_repository.push(RepositoryContribution {
                repository: TOTAL_ROW.to_string(),
                authors: totals.clone(),
            });
        }

        AggregateState {
            per_repository,
            totals,
        }
    }
}
