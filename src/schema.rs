table! {
    beer (id) {
        id -> Int4,
        event_id -> Int4,
        name -> Varchar,
        brewery -> Varchar,
        breweries -> Array<Text>,
        style -> Varchar,
        abv -> Float8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    brewery (id) {
        id -> Int4,
        name -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    event (id) {
        id -> Int4,
        title -> Nullable<Varchar>,
        date -> Date,
        chooser -> Nullable<Varchar>,
        notes -> Nullable<Text>,
        created_by -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    login_session (id) {
        id -> Varchar,
        email -> Varchar,
        name -> Varchar,
        image -> Nullable<Varchar>,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
    }
}

table! {
    review (id) {
        id -> Int4,
        beer_id -> Int4,
        event_id -> Int4,
        user_email -> Varchar,
        user_name -> Varchar,
        rating -> Int2,
        description -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    whitelisted_email (id) {
        id -> Int4,
        email -> Varchar,
        added_at -> Timestamptz,
    }
}

joinable!(beer -> event (event_id));
joinable!(review -> beer (beer_id));

allow_tables_to_appear_in_same_query!(
    beer,
    brewery,
    event,
    login_session,
    review,
    whitelisted_email,
);
