use crate::model::AuthorGroup;

pub fn parse_author_spec(spec: &str) -> Vec<AuthorGroup> {
    spec.split(',')
        .filter_map(|segment| {
            let aliases: Vec<String> = segment.split_whitespace().map(str::to_string).collect();
            AuthorGroup::new(aliases)
        })
        .collect()
}
