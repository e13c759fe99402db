use crate::model::movie::MovieCollection;

#[derive(Debug, Clone, PartialEq)]
pub struct MovieStats {
    pub average: f64,
    pub median: f64,
    pub best: (String, f64),
    pub worst: (String, f64),
}

/// Rating statistics, or `None` for an empty collection. Ties for best and
/// worst go to the movie that comes first.
pub fn movie_stats(movies: &MovieCollection) -> Option<MovieStats> {
    let (first_title, first) = movies.first()?;

    let mut best = (first_title, first.rating);
    let mut worst = (first_title, first.rating);
    for (title, movie) in movies.iter().skip(1) {
        if movie.rating > best.1 {
            best = (title, movie.rating);
        }
        if movie.rating < worst.1 {
            worst = (title, movie.rating);
        }
    }

    let mut ratings: Vec<f64> = movies.values().map(|m| m.rating).collect();
    let average = ratings.iter().sum::<f64>() / ratings.len() as f64;

    ratings.sort_by(f64::total_cmp);
    let middle = ratings.len() / 2;
    let median = if ratings.len() % 2 == 0 {
        (ratings[middle - 1] + ratings[middle]) / 2.0
    } else {
        ratings[middle]
    };

    Some(MovieStats {
        average,
        median,
        best: (best.0.clone(), best.1),
        worst: (worst.0.clone(), worst.1),
    })
}
