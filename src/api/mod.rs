use rocket::Route;

mod admin;
mod audience;
mod category;
mod respondent;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(audience::routes());
    routes.extend(category::routes());
    routes.extend(respondent::routes());
    routes
}
